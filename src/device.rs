//! Device aggregate and lifecycle
//!
//! [`Mpu6050Driver`] owns the bus, the power sequencer, the cached
//! configuration, the shared axis state and the sample sink, and runs the
//! lifecycle state machine: identification, default configuration, engine
//! control, acquisition ticks and suspend/resume. Control-plane methods
//! take `&mut self`, so one instance behind one lock serializes every
//! transition.

use device_driver::RegisterInterface;
use embedded_hal::delay::DelayNs;

use crate::acquisition::{AcquisitionMode, AxisState, SampleSink};
use crate::config::{self, ChipConfig};
use crate::interface::{modify_byte, read_axis_block, read_byte, write_byte};
use crate::power::{EnableLine, PowerSequencer, Regulator};
use crate::registers::{
    ChipVariant, RegisterMap, ACCEL_SCALE_SHIFT_8G, BIT_CLK_MASK, BIT_H_RESET,
    BIT_PWR_ACCEL_STBY, BIT_PWR_GYRO_STBY, BIT_SLEEP, GYRO_SCALE_SHIFT_FS0, MPU6050_ID,
    MPU6050_LPA_5HZ, MPU6500_ID, MPU_CLK_INTERNAL, MPU_CLK_PLL_X, SENSOR_UP_TIME_MS,
};
use crate::remap::{remap_accel, remap_gyro, Orientation};
use crate::{Error, DEFAULT_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS};

/// Which chip the caller expects on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipSelector {
    /// Trust that the part is an MPU-6050
    Mpu6050,
    /// Trust that the part is an MPU-6500
    Mpu6500,
    /// Read the identity register and resolve the variant from it
    Auto,
}

/// Lifecycle state of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Nothing known about the chip yet
    Uninitialized,
    /// Variant resolved, no configuration applied
    Identified,
    /// Default configuration applied; engines may be toggled
    Configured,
    /// Rails down after an explicit suspend
    Suspended,
}

/// One of the two measurement engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Engine {
    /// Accelerometer
    Accel,
    /// Gyroscope
    Gyro,
}

impl Engine {
    const fn standby_mask(self) -> u8 {
        match self {
            Engine::Accel => BIT_PWR_ACCEL_STBY,
            Engine::Gyro => BIT_PWR_GYRO_STBY,
        }
    }
}

/// Scratch register address/data pair for the debug attributes
#[derive(Debug, Default, Clone, Copy)]
struct DebugSession {
    addr: u8,
    data: u8,
}

/// MPU-6050/6500 driver.
///
/// Generic over the register bus, the rail regulators, the enable line
/// and the sample sink.
pub struct Mpu6050Driver<I, R, L, S> {
    bus: I,
    power: PowerSequencer<R, L>,
    sink: S,
    mode: AcquisitionMode,
    orientation: Orientation,
    variant: Option<ChipVariant>,
    reg: RegisterMap,
    cfg: ChipConfig,
    axis: AxisState,
    state: DeviceState,
    accel_poll_ms: u32,
    gyro_poll_ms: u32,
    accel_polling: bool,
    gyro_polling: bool,
    irq_enabled: bool,
    debug: DebugSession,
}

impl<I, R, L, S> Mpu6050Driver<I, R, L, S>
where
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    /// Create a driver over its collaborators.
    ///
    /// The acquisition mode and mounting orientation are fixed for the
    /// driver's lifetime. The device starts [`DeviceState::Uninitialized`]
    /// and unpowered.
    pub fn new(
        bus: I,
        power: PowerSequencer<R, L>,
        sink: S,
        mode: AcquisitionMode,
        orientation: Orientation,
    ) -> Self {
        let (accel_poll_ms, gyro_poll_ms) = match mode {
            AcquisitionMode::Polled {
                accel_interval_ms,
                gyro_interval_ms,
            } => (
                accel_interval_ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS),
                gyro_interval_ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS),
            ),
            AcquisitionMode::Interrupt => (DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS),
        };
        Self {
            bus,
            power,
            sink,
            mode,
            orientation,
            variant: None,
            // Both variants share their addresses; a provisional map lets
            // identification itself go through register accessors.
            reg: RegisterMap::for_variant(ChipVariant::Mpu6050),
            cfg: ChipConfig::cleared(),
            axis: AxisState::new(),
            state: DeviceState::Uninitialized,
            accel_poll_ms,
            gyro_poll_ms,
            accel_polling: false,
            gyro_polling: false,
            irq_enabled: false,
            debug: DebugSession::default(),
        }
    }

    /// Bring the power rails up
    pub fn power_on<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>> {
        self.power.power_on(delay)?;
        Ok(())
    }

    /// Bring the power rails down
    pub fn power_off<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>> {
        self.power.power_off(delay)?;
        Ok(())
    }

    /// Reset the chip and resolve its variant.
    ///
    /// Writes the full-reset bit, toggles the sleep bit once (sleep then
    /// wake) so the measurement clock stabilizes, then either trusts the
    /// selector or reads the identity register. An identity byte that
    /// matches neither supported part fails with [`Error::UnknownDevice`].
    pub fn identify(&mut self, selector: ChipSelector) -> Result<ChipVariant, Error<I::Error>> {
        write_byte(&mut self.bus, self.reg.pwr_mgmt_1, BIT_H_RESET).map_err(Error::Bus)?;

        self.set_power_mode(false)?;
        self.set_power_mode(true)?;

        let variant = match selector {
            ChipSelector::Mpu6050 => ChipVariant::Mpu6050,
            ChipSelector::Mpu6500 => ChipVariant::Mpu6500,
            ChipSelector::Auto => {
                let id = read_byte(&mut self.bus, self.reg.who_am_i).map_err(Error::Bus)?;
                match id {
                    MPU6050_ID => ChipVariant::Mpu6050,
                    MPU6500_ID => ChipVariant::Mpu6500,
                    other => {
                        error!("invalid chip id {:#x}", other);
                        return Err(Error::UnknownDevice(other));
                    }
                }
            }
        };

        self.variant = Some(variant);
        self.reg = RegisterMap::for_variant(variant);
        self.state = DeviceState::Identified;
        info!("identified chip variant {:?}", variant);
        Ok(variant)
    }

    /// Apply the default configuration.
    ///
    /// Puts both engines in standby, programs the low-power wake
    /// frequency, then resets the chip and writes the configuration
    /// baseline. Requires a successful [`identify`](Self::identify)
    /// first.
    pub fn init_defaults<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>> {
        let variant = self.variant.ok_or(Error::NotConfigured)?;

        self.switch_engine(false, Engine::Gyro.standby_mask(), delay)?;
        self.switch_engine(false, Engine::Accel.standby_mask(), delay)?;

        config::set_lpa_freq(&mut self.bus, &self.reg, variant, &mut self.cfg, MPU6050_LPA_5HZ)?;

        self.cfg.is_asleep = false;
        config::init_defaults(&mut self.bus, &self.reg, &mut self.cfg, delay)?;
        self.state = DeviceState::Configured;
        Ok(())
    }

    /// Turn a measurement engine on or off.
    ///
    /// Enabling the first engine after a full power-down powers the rails
    /// back up and restores the cached configuration. Engine-register
    /// failures surface as [`Error::Busy`]; power and restore failures
    /// keep their own variants. Disable order differs per engine on
    /// purpose: the accelerometer stops its poller before touching the
    /// engine, the gyroscope disables the engine first.
    pub fn set_engine<D: DelayNs>(
        &mut self,
        engine: Engine,
        on: bool,
        delay: &mut D,
    ) -> Result<(), Error<I::Error>> {
        match self.state {
            DeviceState::Uninitialized | DeviceState::Identified => {
                return Err(Error::NotConfigured)
            }
            DeviceState::Configured | DeviceState::Suspended => {}
        }
        if on && self.cfg.is_asleep {
            error!("engine enable rejected, device is asleep");
            return Err(Error::DeviceAsleep);
        }

        if on {
            if !self.cfg.enable {
                self.power.power_on(delay)?;
                let variant = self.variant.ok_or(Error::NotConfigured)?;
                config::restore(&mut self.bus, &self.reg, variant, &mut self.cfg)?;
            }
            self.engine_enable(engine, true, delay).map_err(as_busy)?;
            self.arm(engine);
        } else {
            match engine {
                Engine::Accel => {
                    self.disarm(engine);
                    self.engine_enable(engine, false, delay).map_err(as_busy)?;
                }
                Engine::Gyro => {
                    self.engine_enable(engine, false, delay).map_err(as_busy)?;
                    self.disarm(engine);
                }
            }
        }
        Ok(())
    }

    fn arm(&mut self, engine: Engine) {
        match self.mode {
            AcquisitionMode::Interrupt => self.irq_enabled = true,
            AcquisitionMode::Polled { .. } => match engine {
                Engine::Accel => self.accel_polling = true,
                Engine::Gyro => self.gyro_polling = true,
            },
        }
    }

    fn disarm(&mut self, engine: Engine) {
        match self.mode {
            AcquisitionMode::Interrupt => self.irq_enabled = false,
            AcquisitionMode::Polled { .. } => match engine {
                Engine::Accel => self.accel_polling = false,
                Engine::Gyro => self.gyro_polling = false,
            },
        }
    }

    /// Engine on/off against pwr_mgmt_1/2, shared-sleep-bit policy
    /// included. Each cached flag flips only after its register write
    /// went through.
    fn engine_enable<D: DelayNs>(
        &mut self,
        engine: Engine,
        on: bool,
        delay: &mut D,
    ) -> Result<(), Error<I::Error>> {
        if self.cfg.is_asleep {
            return Err(Error::DeviceAsleep);
        }

        let data = read_byte(&mut self.bus, self.reg.pwr_mgmt_1).map_err(Error::Bus)?;

        if on {
            self.switch_engine(true, engine.standby_mask(), delay)?;
            match engine {
                Engine::Accel => self.cfg.accel_enable = true,
                Engine::Gyro => self.cfg.gyro_enable = true,
            }
            write_byte(&mut self.bus, self.reg.pwr_mgmt_1, data & !BIT_SLEEP)
                .map_err(Error::Bus)?;
            self.cfg.enable = true;
        } else {
            self.switch_engine(false, engine.standby_mask(), delay)?;
            let other_running = match engine {
                Engine::Accel => {
                    self.cfg.accel_enable = false;
                    self.cfg.gyro_enable
                }
                Engine::Gyro => {
                    self.cfg.gyro_enable = false;
                    self.cfg.accel_enable
                }
            };
            if !other_running {
                write_byte(&mut self.bus, self.reg.pwr_mgmt_1, data | BIT_SLEEP)
                    .map_err(Error::Bus)?;
                self.cfg.enable = false;
            }
        }
        Ok(())
    }

    /// Flip standby bits in pwr_mgmt_2, with the clock-source rule.
    ///
    /// The measurement clock may only come from the gyro while the gyro
    /// engine runs: gyro-off switches to the internal clock before
    /// standby is asserted; gyro-on leaves standby, waits for the engine
    /// to spin up, then moves the clock to the PLL.
    fn switch_engine<D: DelayNs>(
        &mut self,
        en: bool,
        mask: u8,
        delay: &mut D,
    ) -> Result<(), Error<I::Error>> {
        let mut mgmt_1 = MPU_CLK_INTERNAL;
        if mask == BIT_PWR_GYRO_STBY {
            mgmt_1 = read_byte(&mut self.bus, self.reg.pwr_mgmt_1).map_err(Error::Bus)?
                & !BIT_CLK_MASK;
            if !en {
                write_byte(&mut self.bus, self.reg.pwr_mgmt_1, mgmt_1 | MPU_CLK_INTERNAL)
                    .map_err(Error::Bus)?;
            }
        }

        modify_byte(&mut self.bus, self.reg.pwr_mgmt_2, |data| {
            if en {
                data & !mask
            } else {
                data | mask
            }
        })
        .map_err(Error::Bus)?;

        if mask == BIT_PWR_GYRO_STBY && en {
            delay.delay_ms(SENSOR_UP_TIME_MS);
            write_byte(&mut self.bus, self.reg.pwr_mgmt_1, mgmt_1 | MPU_CLK_PLL_X)
                .map_err(Error::Bus)?;
        }
        Ok(())
    }

    /// Set or clear the device-wide sleep bit
    fn set_power_mode(&mut self, power_on: bool) -> Result<(), Error<I::Error>> {
        modify_byte(&mut self.bus, self.reg.pwr_mgmt_1, |value| {
            if power_on {
                value & !BIT_SLEEP
            } else {
                value | BIT_SLEEP
            }
        })
        .map_err(Error::Bus)
    }

    /// Change an engine's poll interval, clamped to the accepted range.
    ///
    /// The accelerometer path also rewrites the sample-rate divider when
    /// the value actually changes; the cached interval only moves once
    /// that write succeeds.
    pub fn set_poll_interval(
        &mut self,
        engine: Engine,
        interval_ms: u32,
    ) -> Result<(), Error<I::Error>> {
        let clamped = interval_ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        match engine {
            Engine::Accel => {
                if self.accel_poll_ms != clamped {
                    write_byte(&mut self.bus, self.reg.sample_rate_div, config::default_divider())
                        .map_err(Error::Bus)?;
                    self.accel_poll_ms = clamped;
                }
            }
            Engine::Gyro => self.gyro_poll_ms = clamped,
        }
        Ok(())
    }

    /// Current poll interval for an engine, milliseconds
    #[must_use]
    pub fn poll_interval(&self, engine: Engine) -> u32 {
        match engine {
            Engine::Accel => self.accel_poll_ms,
            Engine::Gyro => self.gyro_poll_ms,
        }
    }

    /// One accelerometer polling tick: read, remap, publish with offset
    /// and scale applied.
    pub fn poll_accel_once(&mut self) -> Result<(), Error<I::Error>> {
        let raw = read_axis_block(&mut self.bus, self.reg.raw_accel).map_err(Error::Bus)?;
        let sample = remap_accel(self.orientation, raw);
        self.axis.store_accel(sample);
        let off = self.axis.accel_offsets();
        self.sink.report_accel(
            sample[0].wrapping_add(off[0]) >> ACCEL_SCALE_SHIFT_8G,
            sample[1].wrapping_add(off[1]) >> ACCEL_SCALE_SHIFT_8G,
            sample[2].wrapping_add(off[2]) >> ACCEL_SCALE_SHIFT_8G,
        );
        Ok(())
    }

    /// One gyroscope polling tick.
    ///
    /// The X axis keeps the upstream driver's fixed orientation
    /// correction: the offset-adjusted value is negated and stored, and
    /// the offset is added once more on the way out.
    pub fn poll_gyro_once(&mut self) -> Result<(), Error<I::Error>> {
        let raw = read_axis_block(&mut self.bus, self.reg.raw_gyro).map_err(Error::Bus)?;
        let sample = remap_gyro(self.orientation, raw);
        let off = self.axis.gyro_offsets();
        let rx = sample[0].wrapping_add(off[0]).wrapping_neg();
        self.axis.store_gyro([rx, sample[1], sample[2]]);
        self.sink.report_gyro(
            rx.wrapping_add(off[0]) >> GYRO_SCALE_SHIFT_FS0,
            sample[1].wrapping_add(off[1]) >> GYRO_SCALE_SHIFT_FS0,
            sample[2].wrapping_add(off[2]) >> GYRO_SCALE_SHIFT_FS0,
        );
        Ok(())
    }

    /// Data-ready interrupt handler: read both engines and publish the
    /// samples raw. No remap, offset or scaling is applied on this path;
    /// the asymmetry against the polled path is inherited behavior and
    /// kept as-is.
    pub fn handle_interrupt(&mut self) -> Result<(), Error<I::Error>> {
        if !self.irq_enabled {
            return Ok(());
        }
        let accel = read_axis_block(&mut self.bus, self.reg.raw_accel).map_err(Error::Bus)?;
        let gyro = read_axis_block(&mut self.bus, self.reg.raw_gyro).map_err(Error::Bus)?;
        self.axis.store_accel(accel);
        self.axis.store_gyro(gyro);
        self.sink.report_accel(accel[0], accel[1], accel[2]);
        self.sink.report_gyro(gyro[0], gyro[1], gyro[2]);
        Ok(())
    }

    /// Suspend: stop acquisition, set the sleep bit, drop the rails.
    ///
    /// Poller flags are cleared here; callers running the pollers as
    /// tasks must make sure no tick is in flight before invoking this
    /// (see `tasks::PollHandle::stop`).
    pub fn suspend<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>> {
        self.accel_polling = false;
        self.gyro_polling = false;
        self.irq_enabled = false;

        if self.set_power_mode(false).is_err() {
            warn!("could not set sleep bit before power-off");
        }
        self.cfg.is_asleep = true;
        self.power.power_off(delay)?;
        self.state = DeviceState::Suspended;
        debug!("suspended");
        Ok(())
    }

    /// First half of resume: rails back up, enable line asserted, no
    /// settling wait. The caller gives the chip its power-up time (100
    /// ms) and then calls [`complete_resume`](Self::complete_resume);
    /// the `tasks` layer does both.
    pub fn resume<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>> {
        self.power.power_on_deferred_settle(delay)?;
        Ok(())
    }

    /// Second half of resume: restore configuration and re-enable
    /// whichever engines were running before the suspend. Engine flags
    /// in the cached configuration survive the round trip.
    pub fn complete_resume<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>> {
        let variant = self.variant.ok_or(Error::NotConfigured)?;
        config::restore(&mut self.bus, &self.reg, variant, &mut self.cfg)?;

        self.cfg.is_asleep = false;
        self.set_power_mode(self.cfg.enable)?;

        if self.cfg.gyro_enable {
            self.engine_enable(Engine::Gyro, true, delay).map_err(as_busy)?;
            self.arm(Engine::Gyro);
        }
        if self.cfg.accel_enable {
            self.engine_enable(Engine::Accel, true, delay).map_err(as_busy)?;
            self.arm(Engine::Accel);
        }
        self.state = DeviceState::Configured;
        debug!("resumed");
        Ok(())
    }

    /// Remapped snapshot of the raw accelerometer block, without
    /// publishing or touching the shared state
    pub(crate) fn sample_accel(&mut self) -> Result<[i16; 3], Error<I::Error>> {
        let raw = read_axis_block(&mut self.bus, self.reg.raw_accel).map_err(Error::Bus)?;
        Ok(remap_accel(self.orientation, raw))
    }

    /// Remapped snapshot of the raw gyroscope block
    pub(crate) fn sample_gyro(&mut self) -> Result<[i16; 3], Error<I::Error>> {
        let raw = read_axis_block(&mut self.bus, self.reg.raw_gyro).map_err(Error::Bus)?;
        Ok(remap_gyro(self.orientation, raw))
    }

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Resolved chip variant, if identification has run
    #[must_use]
    pub fn variant(&self) -> Option<ChipVariant> {
        self.variant
    }

    /// Cached configuration mirror
    #[must_use]
    pub fn config(&self) -> &ChipConfig {
        &self.cfg
    }

    /// Shared axis readings and offsets
    #[must_use]
    pub fn axis(&self) -> &AxisState {
        &self.axis
    }

    /// Configured acquisition mode
    #[must_use]
    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    /// Configured mounting orientation
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Whether an engine's poller should currently run
    #[must_use]
    pub fn poller_armed(&self, engine: Engine) -> bool {
        match engine {
            Engine::Accel => self.accel_polling,
            Engine::Gyro => self.gyro_polling,
        }
    }

    /// Whether the interrupt path is armed
    #[must_use]
    pub fn irq_armed(&self) -> bool {
        self.irq_enabled
    }

    /// Whether the rails are up
    #[must_use]
    pub fn is_powered(&self) -> bool {
        self.power.is_enabled()
    }

    /// Sample sink access
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Debug session: cached register address
    #[must_use]
    pub fn debug_addr(&self) -> u8 {
        self.debug.addr
    }

    /// Debug session: set the register address
    pub fn debug_set_addr(&mut self, addr: u8) {
        self.debug.addr = addr;
    }

    /// Debug session: cached data byte
    #[must_use]
    pub fn debug_data(&self) -> u8 {
        self.debug.data
    }

    /// Debug session: set the data byte
    pub fn debug_set_data(&mut self, data: u8) {
        self.debug.data = data;
    }

    /// Debug session: read the register at the cached address and keep
    /// the value as the cached data byte
    pub fn debug_read(&mut self) -> Result<u8, Error<I::Error>> {
        let value = read_byte(&mut self.bus, self.debug.addr).map_err(Error::Bus)?;
        self.debug.data = value;
        Ok(value)
    }

    /// Debug session: write the cached data byte to the cached address
    pub fn debug_write(&mut self) -> Result<(), Error<I::Error>> {
        write_byte(&mut self.bus, self.debug.addr, self.debug.data).map_err(Error::Bus)
    }
}

/// Engine-toggle hardware failures surface as `Busy` to the control
/// surface; precondition and power errors keep their own variants.
fn as_busy<E>(err: Error<E>) -> Error<E> {
    match err {
        Error::Bus(_) => Error::Busy,
        other => other,
    }
}
