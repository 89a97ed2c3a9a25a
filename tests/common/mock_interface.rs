//! Mock register interface for driver tests
//!
//! Backs the driver with an in-memory register file plus an operation
//! log, failure injection and canned raw-data sequences. Registers the
//! driver never wrote read back as zero, matching a freshly reset part.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use device_driver::RegisterInterface;

const PWR_MGMT_1: u8 = 0x6B;
const WHO_AM_I: u8 = 0x75;
const RAW_ACCEL: u8 = 0x3B;
const RAW_GYRO: u8 = 0x43;

const BIT_H_RESET: u8 = 0x80;
const BIT_SLEEP: u8 = 0x40;

/// Bus error reported by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Injected communication failure
    Communication,
}

/// One logged bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// A register (or block starting at it) was read
    ReadRegister { address: u8 },
    /// A register was written; single-byte writes only in practice
    WriteRegister { address: u8, value: u8 },
}

#[derive(Default)]
struct MockState {
    registers: HashMap<u8, u8>,
    operations: Vec<Operation>,
    fail_next_read: bool,
    fail_next_write: bool,
    fail_write_to: Option<u8>,
    /// Reads of PWR_MGMT_1 the reset bit stays visible for after a
    /// full-reset write; zero means the bit clears instantly.
    reset_hold_config: u32,
    reset_pending: u32,
    accel_sequence: Vec<[i16; 3]>,
    accel_index: usize,
    gyro_sequence: Vec<[i16; 3]>,
    gyro_index: usize,
}

impl MockState {
    fn new() -> Self {
        let mut state = Self::default();
        // Power-on defaults: device in sleep, MPU-6050 identity.
        state.registers.insert(PWR_MGMT_1, BIT_SLEEP);
        state.registers.insert(WHO_AM_I, 0x68);
        state
    }

    fn store_axes(&mut self, base: u8, sample: [i16; 3]) {
        for (i, axis) in sample.iter().enumerate() {
            let bytes = axis.to_be_bytes();
            self.registers.insert(base + 2 * i as u8, bytes[0]);
            self.registers.insert(base + 2 * i as u8 + 1, bytes[1]);
        }
    }

    /// A full reset clears the register file back to power-on defaults,
    /// keeping the identity byte.
    fn apply_reset(&mut self) {
        let who = *self.registers.get(&WHO_AM_I).unwrap_or(&0x68);
        self.registers.clear();
        self.registers.insert(WHO_AM_I, who);
        if self.reset_hold_config > 0 {
            self.registers.insert(PWR_MGMT_1, BIT_H_RESET | BIT_SLEEP);
            self.reset_pending = self.reset_hold_config;
        } else {
            self.registers.insert(PWR_MGMT_1, BIT_SLEEP);
        }
    }
}

/// Cloneable handle over the shared mock state.
///
/// The driver owns one clone as its bus; the test keeps another to
/// inspect registers and inject behavior.
#[derive(Clone)]
pub struct MockInterface {
    state: Rc<RefCell<MockState>>,
}

impl MockInterface {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::new())),
        }
    }

    /// Current value of a register, zero if never written
    pub fn register(&self, address: u8) -> u8 {
        *self.state.borrow().registers.get(&address).unwrap_or(&0)
    }

    /// Set a register directly, bypassing the log
    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers.insert(address, value);
    }

    /// Override the identity byte (survives a full reset)
    pub fn set_who_am_i(&self, id: u8) {
        self.set_register(WHO_AM_I, id);
    }

    /// Place one accelerometer sample in the raw data registers
    pub fn set_accel_data(&self, sample: [i16; 3]) {
        self.state.borrow_mut().store_axes(RAW_ACCEL, sample);
    }

    /// Place one gyroscope sample in the raw data registers
    pub fn set_gyro_data(&self, sample: [i16; 3]) {
        self.state.borrow_mut().store_axes(RAW_GYRO, sample);
    }

    /// Queue accelerometer samples; each block read at the raw-data base
    /// address serves the next one, sticking at the last
    pub fn set_accel_sequence(&self, samples: Vec<[i16; 3]>) {
        let mut state = self.state.borrow_mut();
        state.accel_sequence = samples;
        state.accel_index = 0;
    }

    /// Queue gyroscope samples, same advance rule as the accelerometer
    pub fn set_gyro_sequence(&self, samples: Vec<[i16; 3]>) {
        let mut state = self.state.borrow_mut();
        state.gyro_sequence = samples;
        state.gyro_index = 0;
    }

    /// Keep the reset bit visible for `reads` polls of PWR_MGMT_1 after
    /// the next full-reset write
    pub fn hold_reset(&self, reads: u32) {
        self.state.borrow_mut().reset_hold_config = reads;
    }

    /// Fail the next read transaction, one-shot
    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    /// Fail the next write transaction, one-shot
    pub fn fail_next_write(&self) {
        self.state.borrow_mut().fail_next_write = true;
    }

    /// Fail the next write addressed to `address`, one-shot
    pub fn fail_write_to(&self, address: u8) {
        self.state.borrow_mut().fail_write_to = Some(address);
    }

    /// Everything the driver put on the bus so far, in order
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// Values written to one register, in order
    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::WriteRegister { address: a, value } if *a == address => Some(*value),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: u8,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.operations.push(Operation::ReadRegister { address });

        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(MockError::Communication);
        }

        // Block reads at the raw-data base addresses advance the canned
        // sequences, mimicking the sensor producing fresh samples.
        if address == RAW_ACCEL && !state.accel_sequence.is_empty() {
            let index = state.accel_index.min(state.accel_sequence.len() - 1);
            let sample = state.accel_sequence[index];
            state.accel_index += 1;
            state.store_axes(RAW_ACCEL, sample);
        }
        if address == RAW_GYRO && !state.gyro_sequence.is_empty() {
            let index = state.gyro_index.min(state.gyro_sequence.len() - 1);
            let sample = state.gyro_sequence[index];
            state.gyro_index += 1;
            state.store_axes(RAW_GYRO, sample);
        }

        if address == PWR_MGMT_1 && state.reset_pending > 0 {
            state.reset_pending -= 1;
            if state.reset_pending == 0 {
                let value = *state.registers.get(&PWR_MGMT_1).unwrap_or(&0);
                state.registers.insert(PWR_MGMT_1, value & !BIT_H_RESET);
            }
        }

        for (i, byte) in read_data.iter_mut().enumerate() {
            *byte = *state
                .registers
                .get(&(address.wrapping_add(i as u8)))
                .unwrap_or(&0);
        }
        Ok(())
    }

    fn write_register(
        &mut self,
        address: u8,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.operations.push(Operation::WriteRegister {
            address,
            value: write_data.first().copied().unwrap_or(0),
        });

        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(MockError::Communication);
        }
        if state.fail_write_to == Some(address) {
            state.fail_write_to = None;
            return Err(MockError::Communication);
        }

        for (i, byte) in write_data.iter().enumerate() {
            let target = address.wrapping_add(i as u8);
            if target == PWR_MGMT_1 && byte & BIT_H_RESET != 0 {
                state.apply_reset();
            } else {
                state.registers.insert(target, *byte);
            }
        }
        Ok(())
    }
}
