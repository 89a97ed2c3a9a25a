#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

// Logging shim must come first so the macros are visible everywhere.
#[macro_use]
mod fmt;

pub mod acquisition;
pub mod attrs;
pub mod calibration;
pub mod config;
pub mod device;
pub mod interface;
pub mod power;
pub mod registers;
pub mod remap;

#[cfg(feature = "tasks")]
pub mod tasks;

// Re-export main types
pub use acquisition::{AcquisitionMode, AxisState, SampleSink};
pub use attrs::{read_attribute, write_attribute, AttrValue, Attribute};
pub use config::{ChipConfig, ConfigField};
pub use device::{ChipSelector, DeviceState, Engine, Mpu6050Driver};
pub use interface::I2cInterface;
pub use power::{
    EnableLine, GpioEnable, PowerError, PowerSequencer, Rail, Regulator, RegulatorFault,
};
pub use registers::{AccelFullScale, ChipVariant, GyroFullScale, RegisterMap};
pub use remap::Orientation;

/// MPU-6050 I2C address when AD0 pin is low (default: 0x68)
pub const I2C_ADDRESS_AD0_LOW: u8 = 0x68;

/// MPU-6050 I2C address when AD0 pin is high (alternative: 0x69)
pub const I2C_ADDRESS_AD0_HIGH: u8 = 0x69;

/// Minimum accepted poll interval, milliseconds
pub const MIN_POLL_INTERVAL_MS: u32 = 1;

/// Maximum accepted poll interval, milliseconds
pub const MAX_POLL_INTERVAL_MS: u32 = 5000;

/// Poll interval applied until the control surface picks one, milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 200;

/// Driver errors
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// A register write while re-applying cached configuration failed;
    /// `field` identifies which setting could not be written
    ConfigWrite {
        /// The configuration field whose register write failed
        field: ConfigField,
        /// Underlying bus error
        cause: E,
    },
    /// Power rail sequencing failure (see [`PowerError`])
    Power(PowerError),
    /// The chip did not clear its reset bit within the retry budget
    ResetTimeout,
    /// Invalid identity register value (contains the byte read)
    UnknownDevice(u8),
    /// Operation requires an awake device but the cached configuration
    /// marks it asleep
    DeviceAsleep,
    /// Engine operations were requested before default configuration was
    /// applied
    NotConfigured,
    /// A requested transition could not complete at the hardware layer
    Busy,
    /// Malformed control-surface input; no hardware access was attempted
    Format,
}

impl<E> From<PowerError> for Error<E> {
    fn from(err: PowerError) -> Self {
        Self::Power(err)
    }
}
