//! Bus interface for the MPU-6050
//!
//! This module provides an implementation of the `device-driver` register
//! interface for I2C communication with the MPU-6050, plus the small
//! byte/block access helpers the rest of the driver is written against.

use crate::I2C_ADDRESS_AD0_LOW;
use device_driver::RegisterInterface;

/// I2C interface for the MPU-6050
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface with the default address (0x68, AD0 pin LOW)
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS_AD0_LOW,
        }
    }

    /// Create a new I2C interface with the alternative address (0x69, AD0 pin HIGH)
    pub const fn alternative(i2c: I2C) -> Self {
        Self {
            i2c,
            address: crate::I2C_ADDRESS_AD0_HIGH,
        }
    }

    /// Create a new I2C interface with a custom device address
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterInterface for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in read_data.len() for I2C
        self.i2c.write_read(self.address, &[address], read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in write_data.len() for I2C
        // Create a buffer with address + data
        let mut buffer = [0u8; 8];
        buffer[0] = address;
        let len = write_data.len().min(7);
        buffer[1..=len].copy_from_slice(&write_data[..len]);

        self.i2c.write(self.address, &buffer[..=len])
    }
}

/// Read a single register byte.
pub(crate) fn read_byte<I>(bus: &mut I, address: u8) -> Result<u8, I::Error>
where
    I: RegisterInterface<AddressType = u8>,
{
    let mut buf = [0u8; 1];
    bus.read_register(address, 8, &mut buf)?;
    Ok(buf[0])
}

/// Write a single register byte.
pub(crate) fn write_byte<I>(bus: &mut I, address: u8, value: u8) -> Result<(), I::Error>
where
    I: RegisterInterface<AddressType = u8>,
{
    bus.write_register(address, 8, &[value])
}

/// Read-modify-write a single register byte.
pub(crate) fn modify_byte<I, F>(bus: &mut I, address: u8, f: F) -> Result<(), I::Error>
where
    I: RegisterInterface<AddressType = u8>,
    F: FnOnce(u8) -> u8,
{
    let current = read_byte(bus, address)?;
    write_byte(bus, address, f(current))
}

/// Read one 3-axis raw block (six bytes, big-endian 16-bit words) in a
/// single transaction to prevent torn reads.
pub(crate) fn read_axis_block<I>(bus: &mut I, address: u8) -> Result<[i16; 3], I::Error>
where
    I: RegisterInterface<AddressType = u8>,
{
    let mut buffer = [0u8; 6];
    bus.read_register(address, 48, &mut buffer)?;
    Ok([
        i16::from_be_bytes([buffer[0], buffer[1]]),
        i16::from_be_bytes([buffer[2], buffer[3]]),
        i16::from_be_bytes([buffer[4], buffer[5]]),
    ])
}
