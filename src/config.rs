//! Cached chip configuration
//!
//! The driver mirrors every register setting it owns in a [`ChipConfig`]
//! so the chip can be re-programmed after a power cycle without consulting
//! hardware state. The mirror only changes after the matching register
//! write has succeeded.

use device_driver::RegisterInterface;
use embedded_hal::delay::DelayNs;

use crate::interface::{modify_byte, read_byte, write_byte};
use crate::registers::{
    AccelFullScale, ChipVariant, GyroFullScale, RegisterMap, ACCEL_CONFIG_FSR_SHIFT,
    BIT_ACCEL_FIFO, BIT_GYRO_FIFO, BIT_H_RESET, BIT_LPA_FREQ_MASK, GYRO_CONFIG_FSR_SHIFT,
    INIT_FIFO_RATE, MPU6050_LPA_5HZ, MPU_DLPF_42HZ, ODR_DLPF_RATE_HZ, RESET_RETRY_COUNT,
    RESET_WAIT_MS,
};
use crate::Error;

/// The configuration field a failed restore write belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigField {
    /// Gyroscope full-scale range
    GyroFsr,
    /// Digital low-pass filter corner
    Lpf,
    /// Accelerometer full-scale range
    AccelFs,
    /// FIFO routing bits
    FifoEnable,
    /// Low-power wake frequency
    LpaFreq,
    /// Sample rate divider
    SampleRateDiv,
}

/// Software mirror of the chip's configuration registers
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipConfig {
    /// Gyroscope full-scale range
    pub fsr: GyroFullScale,
    /// Low-pass filter register value
    pub lpf: u8,
    /// FIFO sample rate, Hz
    pub fifo_rate: u16,
    /// Accelerometer full-scale range
    pub accel_fs: AccelFullScale,
    /// Accelerometer engine running
    pub accel_enable: bool,
    /// Gyroscope engine running
    pub gyro_enable: bool,
    /// Accelerometer output routed to FIFO
    pub accel_fifo_enable: bool,
    /// Gyroscope output routed to FIFO
    pub gyro_fifo_enable: bool,
    /// Low-power wake frequency register value
    pub lpa_freq: u8,
    /// Device-wide sleep bit believed set
    pub is_asleep: bool,
    /// Any engine running (sleep bit believed clear)
    pub enable: bool,
}

impl ChipConfig {
    /// The all-off configuration a freshly reset chip is in
    #[must_use]
    pub const fn cleared() -> Self {
        Self {
            fsr: GyroFullScale::Dps250,
            lpf: 0,
            fifo_rate: 0,
            accel_fs: AccelFullScale::G2,
            accel_enable: false,
            gyro_enable: false,
            accel_fifo_enable: false,
            gyro_fifo_enable: false,
            lpa_freq: 0,
            is_asleep: false,
            enable: false,
        }
    }
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self::cleared()
    }
}

/// Default sample-rate divider value (1 kHz filtered rate at 50 Hz output)
pub(crate) const fn default_divider() -> u8 {
    (ODR_DLPF_RATE_HZ / INIT_FIFO_RATE - 1) as u8
}

/// Reset the chip and program the default configuration.
///
/// Defaults: gyro FSR ±2000 dps, 42 Hz low-pass corner, 50 Hz output
/// rate, accel FS ±8g, both engines left in standby by the caller.
///
/// The reset bit is polled a bounded number of times; a chip that never
/// clears it is reported as [`Error::ResetTimeout`] rather than spun on
/// forever.
pub(crate) fn init_defaults<I, D>(
    bus: &mut I,
    reg: &RegisterMap,
    cfg: &mut ChipConfig,
    delay: &mut D,
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
    D: DelayNs,
{
    write_byte(bus, reg.pwr_mgmt_1, BIT_H_RESET).map_err(Error::Bus)?;

    let mut cleared = false;
    for _ in 0..RESET_RETRY_COUNT {
        delay.delay_ms(RESET_WAIT_MS);
        let status = read_byte(bus, reg.pwr_mgmt_1).map_err(Error::Bus)?;
        if status & BIT_H_RESET == 0 {
            cleared = true;
            break;
        }
    }
    if !cleared {
        error!("reset bit still set after retry budget");
        return Err(Error::ResetTimeout);
    }

    *cfg = ChipConfig::cleared();

    write_byte(
        bus,
        reg.gyro_config,
        GyroFullScale::Dps2000.fsr_value() << GYRO_CONFIG_FSR_SHIFT,
    )
    .map_err(Error::Bus)?;
    cfg.fsr = GyroFullScale::Dps2000;

    write_byte(bus, reg.lpf, MPU_DLPF_42HZ).map_err(Error::Bus)?;
    cfg.lpf = MPU_DLPF_42HZ;

    write_byte(bus, reg.sample_rate_div, default_divider()).map_err(Error::Bus)?;
    cfg.fifo_rate = INIT_FIFO_RATE;

    write_byte(
        bus,
        reg.accel_config,
        AccelFullScale::G8.fsr_value() << ACCEL_CONFIG_FSR_SHIFT,
    )
    .map_err(Error::Bus)?;
    cfg.accel_fs = AccelFullScale::G8;

    debug!("default configuration applied");
    Ok(())
}

/// Program the low-power wake frequency.
///
/// Only the MPU-6050 carries the field in PWR_MGMT_2; on other variants
/// the mirror is updated without a register write.
pub(crate) fn set_lpa_freq<I>(
    bus: &mut I,
    reg: &RegisterMap,
    variant: ChipVariant,
    cfg: &mut ChipConfig,
    lpa_freq: u8,
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    if variant == ChipVariant::Mpu6050 {
        modify_byte(bus, reg.pwr_mgmt_2, |data| {
            (data & !BIT_LPA_FREQ_MASK) | MPU6050_LPA_5HZ
        })
        .map_err(Error::Bus)?;
    }
    cfg.lpa_freq = lpa_freq;
    Ok(())
}

/// Re-apply the cached configuration after a power cycle.
///
/// The first failing register write aborts and names its field, so
/// callers can tell which setting the chip is now out of sync on.
pub(crate) fn restore<I>(
    bus: &mut I,
    reg: &RegisterMap,
    variant: ChipVariant,
    cfg: &mut ChipConfig,
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    info!("restoring chip configuration");

    write_byte(
        bus,
        reg.gyro_config,
        cfg.fsr.fsr_value() << GYRO_CONFIG_FSR_SHIFT,
    )
    .map_err(|cause| Error::ConfigWrite {
        field: ConfigField::GyroFsr,
        cause,
    })?;

    write_byte(bus, reg.lpf, cfg.lpf).map_err(|cause| Error::ConfigWrite {
        field: ConfigField::Lpf,
        cause,
    })?;

    write_byte(
        bus,
        reg.accel_config,
        cfg.accel_fs.fsr_value() << ACCEL_CONFIG_FSR_SHIFT,
    )
    .map_err(|cause| Error::ConfigWrite {
        field: ConfigField::AccelFs,
        cause,
    })?;

    let mut fifo = read_byte(bus, reg.fifo_en).map_err(|cause| Error::ConfigWrite {
        field: ConfigField::FifoEnable,
        cause,
    })?;
    if cfg.accel_fifo_enable {
        fifo |= BIT_ACCEL_FIFO;
    }
    if cfg.gyro_fifo_enable {
        fifo |= BIT_GYRO_FIFO;
    }
    if cfg.accel_fifo_enable || cfg.gyro_fifo_enable {
        write_byte(bus, reg.fifo_en, fifo).map_err(|cause| Error::ConfigWrite {
            field: ConfigField::FifoEnable,
            cause,
        })?;
    }

    let lpa = cfg.lpa_freq;
    set_lpa_freq(bus, reg, variant, cfg, lpa).map_err(|err| match err {
        Error::Bus(cause) => Error::ConfigWrite {
            field: ConfigField::LpaFreq,
            cause,
        },
        other => other,
    })?;

    write_byte(bus, reg.sample_rate_div, default_divider()).map_err(|cause| {
        Error::ConfigWrite {
            field: ConfigField::SampleRateDiv,
            cause,
        }
    })?;

    debug!("restore finished");
    Ok(())
}
