//! Power rail sequencing
//!
//! The MPU-6050 sits behind three supply rails (core supply, logic/bus
//! pull-up, bus interface) and an optional enable line. This module owns
//! the bring-up/tear-down ordering and the compensation behavior on
//! partial failure; the rails themselves are external collaborators
//! reached through the [`Regulator`] and [`EnableLine`] traits.

use embedded_hal::delay::DelayNs;

/// Settling delay around enable-line toggles, microseconds
pub const POWER_EN_DELAY_US: u32 = 10;

/// Settling time after all rails are up, milliseconds
pub const POWER_UP_TIME_MS: u32 = 100;

/// One of the three supply rails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rail {
    /// Core supply (2.5 V - 3.4 V)
    Vdd,
    /// Logic level / I2C bus pull-up supply (1.8 V)
    Vlogic,
    /// Bus interface supply (1.75 V - 1.95 V)
    Vi2c,
}

/// Opaque regulator failure code, as reported by the rail collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegulatorFault(pub i32);

/// A controllable supply rail
pub trait Regulator {
    /// Enable the rail
    fn enable(&mut self) -> Result<(), RegulatorFault>;
    /// Disable the rail
    fn disable(&mut self) -> Result<(), RegulatorFault>;
}

/// A binary chip-enable line. Toggles are fire-and-forget; the collaborator
/// interface reports no errors.
pub trait EnableLine {
    /// Drive the line active (chip enabled) or inactive
    fn set_active(&mut self, on: bool);
}

/// [`EnableLine`] adapter over an `embedded-hal` output pin.
///
/// Pin errors cannot be surfaced through the enable-line contract, so a
/// failed toggle is logged and otherwise dropped.
pub struct GpioEnable<P>(pub P);

impl<P: embedded_hal::digital::OutputPin> EnableLine for GpioEnable<P> {
    fn set_active(&mut self, on: bool) {
        let result = if on { self.0.set_high() } else { self.0.set_low() };
        if result.is_err() {
            warn!("enable line toggle failed");
        }
    }
}

/// Power sequencing failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// A single rail failed to switch; any rollback succeeded
    Rail {
        /// The rail that failed
        rail: Rail,
        /// The collaborator's failure code
        code: i32,
    },
    /// A rail failed to switch *and* a compensating re-enable also failed;
    /// the rail state is unknown
    Composite,
}

/// Brings the three rails and the enable line up and down in a fixed
/// order, with rollback on partial failure.
///
/// Both transitions are idempotent against the cached `power_enabled`
/// flag: a redundant request logs a warning and succeeds.
pub struct PowerSequencer<R, L> {
    vdd: R,
    vlogic: R,
    vi2c: R,
    enable: Option<L>,
    power_enabled: bool,
}

impl<R, L> PowerSequencer<R, L>
where
    R: Regulator,
    L: EnableLine,
{
    /// Create a sequencer over the three rails and an optional enable line.
    ///
    /// All rails start out assumed off.
    pub const fn new(vdd: R, vlogic: R, vi2c: R, enable: Option<L>) -> Self {
        Self {
            vdd,
            vlogic,
            vi2c,
            enable,
            power_enabled: false,
        }
    }

    /// Whether the last successful transition left the device powered
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.power_enabled
    }

    /// Power the device up: Vdd, Vlogic, Vi2c, then the enable line, then
    /// the fixed power-up settling time.
    ///
    /// A rail failure rolls back every previously enabled rail in reverse
    /// order before the error is returned.
    pub fn power_on<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), PowerError> {
        self.power_on_inner(delay, true)
    }

    /// Power up without the final settling sleep.
    ///
    /// Used on the resume path, where the caller defers the settle and
    /// finishes bring-up asynchronously.
    pub fn power_on_deferred_settle<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), PowerError> {
        self.power_on_inner(delay, false)
    }

    fn power_on_inner<D: DelayNs>(&mut self, delay: &mut D, settle: bool) -> Result<(), PowerError> {
        if self.power_enabled {
            warn!("ignoring power on request, already enabled");
            return Ok(());
        }

        if let Err(fault) = self.vdd.enable() {
            error!("regulator vdd enable failed, code {}", fault.0);
            return Err(PowerError::Rail {
                rail: Rail::Vdd,
                code: fault.0,
            });
        }

        if let Err(fault) = self.vlogic.enable() {
            error!("regulator vlogic enable failed, code {}", fault.0);
            if self.vdd.disable().is_err() {
                warn!("vdd rollback failed");
            }
            return Err(PowerError::Rail {
                rail: Rail::Vlogic,
                code: fault.0,
            });
        }

        if let Err(fault) = self.vi2c.enable() {
            error!("regulator vi2c enable failed, code {}", fault.0);
            if self.vlogic.disable().is_err() {
                warn!("vlogic rollback failed");
            }
            if self.vdd.disable().is_err() {
                warn!("vdd rollback failed");
            }
            return Err(PowerError::Rail {
                rail: Rail::Vi2c,
                code: fault.0,
            });
        }

        if let Some(line) = self.enable.as_mut() {
            delay.delay_us(POWER_EN_DELAY_US);
            line.set_active(true);
        }
        if settle {
            delay.delay_ms(POWER_UP_TIME_MS);
        }
        self.power_enabled = true;
        Ok(())
    }

    /// Power the device down: enable line first (with settling delays on
    /// both sides), then Vdd, Vlogic, Vi2c.
    ///
    /// A Vdd disable failure aborts the sequence immediately; the device
    /// may be left partially powered with the enable line already
    /// de-asserted. This mirrors the upstream sequencing and is a known
    /// risk, not something this layer papers over. A Vlogic failure
    /// re-enables Vdd as compensation; a Vi2c failure re-enables Vlogic
    /// and Vdd. Note the rollback never re-asserts the enable line.
    pub fn power_off<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), PowerError> {
        if !self.power_enabled {
            warn!("ignoring power off request, already disabled");
            return Ok(());
        }

        if let Some(line) = self.enable.as_mut() {
            delay.delay_us(POWER_EN_DELAY_US);
            line.set_active(false);
            delay.delay_us(POWER_EN_DELAY_US);
        }

        if let Err(fault) = self.vdd.disable() {
            error!("regulator vdd disable failed, code {}", fault.0);
            return Err(PowerError::Rail {
                rail: Rail::Vdd,
                code: fault.0,
            });
        }

        if let Err(fault) = self.vlogic.disable() {
            error!("regulator vlogic disable failed, code {}", fault.0);
            if self.vdd.enable().is_err() {
                return Err(PowerError::Composite);
            }
            return Err(PowerError::Rail {
                rail: Rail::Vlogic,
                code: fault.0,
            });
        }

        if let Err(fault) = self.vi2c.disable() {
            error!("regulator vi2c disable failed, code {}", fault.0);
            let vlogic_restore = self.vlogic.enable();
            let vdd_restore = self.vdd.enable();
            if vlogic_restore.is_err() || vdd_restore.is_err() {
                return Err(PowerError::Composite);
            }
            return Err(PowerError::Rail {
                rail: Rail::Vi2c,
                code: fault.0,
            });
        }

        self.power_enabled = false;
        Ok(())
    }
}
