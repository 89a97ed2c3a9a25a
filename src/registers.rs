//! Register definitions for the MPU-6050/MPU-6500
//!
//! Unlike banked parts, the MPU-6050 family exposes a single flat register
//! space. The two supported variants share their register layout, but the
//! driver still resolves a [`RegisterMap`] per [`ChipVariant`] at
//! identification time: everything above this module addresses registers
//! through the map, never through raw constants.

/// Identity register value reported by the MPU-6050
pub const MPU6050_ID: u8 = 0x68;

/// Identity register value reported by the MPU-6500
pub const MPU6500_ID: u8 = 0x70;

/// PWR_MGMT_1: full chip reset
pub const BIT_H_RESET: u8 = 0x80;
/// PWR_MGMT_1: device-wide sleep
pub const BIT_SLEEP: u8 = 0x40;
/// PWR_MGMT_1: clock source select field
pub const BIT_CLK_MASK: u8 = 0x07;
/// Clock source: internal relaxation oscillator
pub const MPU_CLK_INTERNAL: u8 = 0x00;
/// Clock source: PLL referenced to the gyroscope X axis
pub const MPU_CLK_PLL_X: u8 = 0x01;

/// PWR_MGMT_2: gyroscope standby bits (all three axes)
pub const BIT_PWR_GYRO_STBY: u8 = 0x07;
/// PWR_MGMT_2: accelerometer standby bits (all three axes)
pub const BIT_PWR_ACCEL_STBY: u8 = 0x38;
/// PWR_MGMT_2: low-power wake control field
pub const BIT_LPA_FREQ_MASK: u8 = 0xC0;
/// Low-power wake control value for 5 Hz
pub const MPU6050_LPA_5HZ: u8 = 0x40;

/// FIFO_EN: accelerometer output to FIFO
pub const BIT_ACCEL_FIFO: u8 = 0x08;
/// FIFO_EN: gyroscope outputs to FIFO
pub const BIT_GYRO_FIFO: u8 = 0x70;

/// GYRO_CONFIG: full-scale select shift
pub const GYRO_CONFIG_FSR_SHIFT: u8 = 3;
/// ACCEL_CONFIG: full-scale select shift
pub const ACCEL_CONFIG_FSR_SHIFT: u8 = 3;

/// CONFIG register value for a 42 Hz digital low-pass filter corner
pub const MPU_DLPF_42HZ: u8 = 3;

/// Output data rate with the DLPF enabled, Hz
pub const ODR_DLPF_RATE_HZ: u16 = 1000;
/// Default FIFO sample rate, Hz
pub const INIT_FIFO_RATE: u16 = 50;

/// Output scale shift for the ±8g accelerometer range
pub const ACCEL_SCALE_SHIFT_8G: u8 = 2;
/// Output scale shift for the configured gyroscope range
pub const GYRO_SCALE_SHIFT_FS0: u8 = 0;

/// Gyroscope spin-up time before the clock may switch to PLL, milliseconds
pub const SENSOR_UP_TIME_MS: u32 = 30;
/// Reset-bit polls before giving up
pub const RESET_RETRY_COUNT: u32 = 10;
/// Wait between reset-bit polls, milliseconds
pub const RESET_WAIT_MS: u32 = 20;

/// Supported chip variants, resolved once at identification time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipVariant {
    /// Original MPU-6050 (identity 0x68)
    Mpu6050,
    /// MPU-6500 (identity 0x70)
    Mpu6500,
}

/// Gyroscope full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroFullScale {
    /// ±250 °/s
    Dps250 = 0,
    /// ±500 °/s
    Dps500 = 1,
    /// ±1000 °/s
    Dps1000 = 2,
    /// ±2000 °/s
    Dps2000 = 3,
}

impl GyroFullScale {
    /// Field value for the GYRO_CONFIG register (before shifting)
    #[must_use]
    pub const fn fsr_value(self) -> u8 {
        self as u8
    }
}

/// Accelerometer full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelFullScale {
    /// ±2g range
    G2 = 0,
    /// ±4g range
    G4 = 1,
    /// ±8g range
    G8 = 2,
    /// ±16g range
    G16 = 3,
}

impl AccelFullScale {
    /// Field value for the ACCEL_CONFIG register (before shifting)
    #[must_use]
    pub const fn fsr_value(self) -> u8 {
        self as u8
    }

    /// Sensitivity in LSB/g at this range
    #[must_use]
    pub const fn unit_per_g(self) -> i16 {
        match self {
            Self::G2 => 16384,
            Self::G4 => 8192,
            Self::G8 => 4096,
            Self::G16 => 2048,
        }
    }
}

/// Logical register name to address mapping for one chip variant.
///
/// Read-only after identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap {
    /// SMPLRT_DIV - sample rate divider
    pub sample_rate_div: u8,
    /// CONFIG - digital low-pass filter setting
    pub lpf: u8,
    /// GYRO_CONFIG - gyroscope full-scale select
    pub gyro_config: u8,
    /// ACCEL_CONFIG - accelerometer full-scale select
    pub accel_config: u8,
    /// FIFO_EN - per-sensor FIFO routing
    pub fifo_en: u8,
    /// INT_ENABLE - interrupt source enables
    pub int_enable: u8,
    /// INT_STATUS - interrupt source status
    pub int_status: u8,
    /// ACCEL_XOUT_H - start of the raw accelerometer block
    pub raw_accel: u8,
    /// TEMP_OUT_H - raw temperature
    pub temperature: u8,
    /// GYRO_XOUT_H - start of the raw gyroscope block
    pub raw_gyro: u8,
    /// FIFO_COUNT_H - FIFO fill level
    pub fifo_count_h: u8,
    /// FIFO_R_W - FIFO read/write port
    pub fifo_r_w: u8,
    /// WHO_AM_I - identity register
    pub who_am_i: u8,
    /// PWR_MGMT_1 - sleep, reset, clock source
    pub pwr_mgmt_1: u8,
    /// PWR_MGMT_2 - engine standby, low-power wake control
    pub pwr_mgmt_2: u8,
}

impl RegisterMap {
    /// Resolve the register map for a chip variant.
    ///
    /// Both supported variants currently share the same addresses; the
    /// variant parameter keeps the resolution point explicit for parts
    /// that diverge.
    #[must_use]
    pub const fn for_variant(variant: ChipVariant) -> Self {
        let _ = variant;
        Self {
            sample_rate_div: 0x19,
            lpf: 0x1A,
            gyro_config: 0x1B,
            accel_config: 0x1C,
            fifo_en: 0x23,
            int_enable: 0x38,
            int_status: 0x3A,
            raw_accel: 0x3B,
            temperature: 0x41,
            raw_gyro: 0x43,
            fifo_count_h: 0x72,
            fifo_r_w: 0x74,
            who_am_i: 0x75,
            pwr_mgmt_1: 0x6B,
            pwr_mgmt_2: 0x6C,
        }
    }
}
