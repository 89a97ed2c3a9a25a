//! Textual control surface
//!
//! One attribute per concern, read and written as text, the way a sysfs
//! style tooling layer talks to the driver. Parse failures are reported
//! as [`Error::Format`] before any hardware is touched; hardware-layer
//! failures come back as [`Error::Busy`].

use core::fmt::Write as _;
use core::sync::atomic::Ordering;

use device_driver::RegisterInterface;
use embedded_hal::delay::DelayNs;

use crate::acquisition::SampleSink;
use crate::device::{Engine, Mpu6050Driver};
use crate::power::{EnableLine, Regulator};
use crate::Error;

/// Attribute output buffer
pub type AttrValue = heapless::String<16>;

/// Control-surface attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    /// Persistent X offset for the addressed engine
    OffsetX,
    /// Persistent Y offset for the addressed engine
    OffsetY,
    /// Persistent Z offset for the addressed engine
    OffsetZ,
    /// Poll interval in milliseconds
    PollDelay,
    /// Engine enable as boolean-as-integer
    Enable,
    /// Calibration trigger (write-only)
    Calibrate,
    /// Debug session register address
    DebugAddr,
    /// Debug session data byte; reading performs a bus read at the
    /// cached address
    DebugReg,
    /// Debug write trigger (write-only): cached data byte to cached
    /// address
    DebugWrite,
}

// Only meaningful for the three offset attributes.
fn offset_cell<'a, I, R, L, S>(
    device: &'a Mpu6050Driver<I, R, L, S>,
    engine: Engine,
    attr: Attribute,
) -> &'a core::sync::atomic::AtomicI16
where
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    let axis = device.axis();
    match (engine, attr) {
        (Engine::Accel, Attribute::OffsetY) => &axis.off_y,
        (Engine::Accel, Attribute::OffsetZ) => &axis.off_z,
        (Engine::Accel, _) => &axis.off_x,
        (Engine::Gyro, Attribute::OffsetY) => &axis.off_ry,
        (Engine::Gyro, Attribute::OffsetZ) => &axis.off_rz,
        (Engine::Gyro, _) => &axis.off_rx,
    }
}

fn busy_on_bus<E>(err: Error<E>) -> Error<E> {
    match err {
        Error::Bus(_) => Error::Busy,
        other => other,
    }
}

/// Read an attribute into a text buffer.
///
/// Write-only attributes report [`Error::Format`].
pub fn read_attribute<I, R, L, S>(
    device: &mut Mpu6050Driver<I, R, L, S>,
    engine: Engine,
    attr: Attribute,
    out: &mut AttrValue,
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    out.clear();
    match attr {
        Attribute::OffsetX | Attribute::OffsetY | Attribute::OffsetZ => {
            let value = offset_cell(device, engine, attr).load(Ordering::Relaxed);
            write!(out, "{}", value).map_err(|_| Error::Format)?;
        }
        Attribute::PollDelay => {
            write!(out, "{}", device.poll_interval(engine)).map_err(|_| Error::Format)?;
        }
        Attribute::Enable => {
            let enabled = match engine {
                Engine::Accel => device.config().accel_enable,
                Engine::Gyro => device.config().gyro_enable,
            };
            write!(out, "{}", u8::from(enabled)).map_err(|_| Error::Format)?;
        }
        Attribute::DebugAddr => {
            write!(out, "{}", device.debug_addr()).map_err(|_| Error::Format)?;
        }
        Attribute::DebugReg => {
            let value = device.debug_read().map_err(busy_on_bus)?;
            write!(out, "{:#x}", value).map_err(|_| Error::Format)?;
        }
        Attribute::Calibrate | Attribute::DebugWrite => return Err(Error::Format),
    }
    Ok(())
}

/// Write an attribute from text.
///
/// Offsets and the debug address/data parse as decimal integers; enable
/// parses boolean-as-integer (any nonzero enables); the calibrate and
/// debug-write attributes are pure triggers and ignore their payload.
pub fn write_attribute<I, R, L, S, D>(
    device: &mut Mpu6050Driver<I, R, L, S>,
    engine: Engine,
    attr: Attribute,
    input: &str,
    delay: &mut D,
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
    D: DelayNs,
{
    match attr {
        Attribute::OffsetX | Attribute::OffsetY | Attribute::OffsetZ => {
            let value: i16 = input.trim().parse().map_err(|_| Error::Format)?;
            offset_cell(device, engine, attr).store(value, Ordering::Relaxed);
        }
        Attribute::PollDelay => {
            let interval: u32 = input.trim().parse().map_err(|_| Error::Format)?;
            device
                .set_poll_interval(engine, interval)
                .map_err(busy_on_bus)?;
        }
        Attribute::Enable => {
            let value: u32 = input.trim().parse().map_err(|_| Error::Format)?;
            device.set_engine(engine, value != 0, delay)?;
        }
        Attribute::Calibrate => {
            device.calibrate(engine, delay)?;
        }
        Attribute::DebugAddr => {
            let addr: u8 = input.trim().parse().map_err(|_| Error::Format)?;
            device.debug_set_addr(addr);
        }
        Attribute::DebugReg => {
            let data: u8 = input.trim().parse().map_err(|_| Error::Format)?;
            device.debug_set_data(data);
        }
        Attribute::DebugWrite => {
            device.debug_write().map_err(busy_on_bus)?;
        }
    }
    Ok(())
}
