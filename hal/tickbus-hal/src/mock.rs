//! Mock transport for host testing
//!
//! Records every queued write (with its window) and every read, and keeps a
//! small per-address register file so read-modify-write sequences behave
//! like real devices. Failures can be injected on a chosen write or on the
//! next read.

use heapless::Vec;

use crate::clock::Window;
use crate::i2c::ScheduledI2c;

/// Maximum recorded operations
pub const MAX_OPS: usize = 128;

/// Maximum bytes recorded per write
pub const MAX_PAYLOAD: usize = 8;

/// Maximum simulated registers across all addresses
pub const MAX_REGISTERS: usize = 64;

/// Mock transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MockI2cError {
    /// Failure requested by the test
    Injected,
    /// Operation log or register file is full
    Overflow,
}

/// One recorded transport operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cOp {
    /// Queued write
    Write {
        address: u8,
        data: Vec<u8, MAX_PAYLOAD>,
        window: Window,
    },
    /// Register read
    Read { address: u8, register: u8, len: usize },
}

impl I2cOp {
    /// Device address of the operation
    pub fn address(&self) -> u8 {
        match self {
            I2cOp::Write { address, .. } | I2cOp::Read { address, .. } => *address,
        }
    }
}

/// Recording I2C transport
#[derive(Debug, Default)]
pub struct MockI2c {
    ops: Vec<I2cOp, MAX_OPS>,
    registers: Vec<(u8, u8, u8), MAX_REGISTERS>,
    fail_write_in: Option<usize>,
    fail_next_read: bool,
}

impl MockI2c {
    /// Create a mock with an empty register file
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MockI2c::set_register`]
    pub fn with_register(mut self, address: u8, register: u8, value: u8) -> Self {
        // Test setup only; capacity is far above what any test seeds
        let _ = self.set_register(address, register, value);
        self
    }

    /// Set a simulated register value
    pub fn set_register(
        &mut self,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), MockI2cError> {
        if let Some(slot) = self
            .registers
            .iter_mut()
            .find(|(a, r, _)| *a == address && *r == register)
        {
            slot.2 = value;
            return Ok(());
        }
        self.registers
            .push((address, register, value))
            .map_err(|_| MockI2cError::Overflow)
    }

    /// Current simulated register value, if it was ever set or written
    pub fn register(&self, address: u8, register: u8) -> Option<u8> {
        self.registers
            .iter()
            .find(|(a, r, _)| *a == address && *r == register)
            .map(|(_, _, v)| *v)
    }

    /// Fail the `n`th write from now (0 = the next write)
    pub fn fail_write_in(&mut self, n: usize) {
        self.fail_write_in = Some(n);
    }

    /// Fail the next read
    pub fn fail_next_read(&mut self) {
        self.fail_next_read = true;
    }

    /// All recorded operations, oldest first
    pub fn ops(&self) -> &[I2cOp] {
        &self.ops
    }

    /// Recorded writes as `(address, payload, window)`
    pub fn writes(&self) -> impl Iterator<Item = (u8, &[u8], Window)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            I2cOp::Write {
                address,
                data,
                window,
            } => Some((*address, data.as_slice(), *window)),
            I2cOp::Read { .. } => None,
        })
    }

    /// Recorded writes to one address
    pub fn writes_to(&self, address: u8) -> impl Iterator<Item = (&[u8], Window)> + '_ {
        self.writes()
            .filter(move |(a, _, _)| *a == address)
            .map(|(_, data, window)| (data, window))
    }

    /// Forget recorded operations (the register file is kept)
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl ScheduledI2c for MockI2c {
    type Error = MockI2cError;

    fn write(&mut self, address: u8, data: &[u8], window: Window) -> Result<(), Self::Error> {
        match self.fail_write_in {
            Some(0) => {
                self.fail_write_in = None;
                return Err(MockI2cError::Injected);
            }
            Some(n) => self.fail_write_in = Some(n - 1),
            None => {}
        }

        let payload = Vec::from_slice(data).map_err(|_| MockI2cError::Overflow)?;
        self.ops
            .push(I2cOp::Write {
                address,
                data: payload,
                window,
            })
            .map_err(|_| MockI2cError::Overflow)?;

        // [register, value, value, ...] auto-increments like the real parts
        if let Some((&register, values)) = data.split_first() {
            for (offset, &value) in values.iter().enumerate() {
                self.set_register(address, register.wrapping_add(offset as u8), value)?;
            }
        }
        Ok(())
    }

    fn read(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_next_read {
            self.fail_next_read = false;
            return Err(MockI2cError::Injected);
        }

        self.ops
            .push(I2cOp::Read {
                address,
                register,
                len: buf.len(),
            })
            .map_err(|_| MockI2cError::Overflow)?;

        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = self
                .register(address, register.wrapping_add(offset as u8))
                .unwrap_or(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_updates_register_file() {
        let mut bus = MockI2c::new();

        bus.write(0x4C, &[0x4C, 0x20], Window::new(5, 10)).unwrap();

        assert_eq!(bus.register(0x4C, 0x4C), Some(0x20));
        assert_eq!(bus.ops().len(), 1);
        let (address, data, window) = bus.writes().next().unwrap();
        assert_eq!(address, 0x4C);
        assert_eq!(data, &[0x4C, 0x20]);
        assert_eq!(window, Window::new(5, 10));
    }

    #[test]
    fn test_single_byte_write_is_recorded_only() {
        let mut bus = MockI2c::new();

        bus.write(0x70, &[0x08], Window::IMMEDIATE).unwrap();

        assert_eq!(bus.writes_to(0x70).count(), 1);
        assert_eq!(bus.register(0x70, 0x08), None);
    }

    #[test]
    fn test_read_auto_increments() {
        let mut bus = MockI2c::new()
            .with_register(0x4C, 0x46, 0x34)
            .with_register(0x4C, 0x47, 0x12);
        let mut buf = [0u8; 3];

        bus.read(0x4C, 0x46, &mut buf).unwrap();

        // Unset registers read as zero
        assert_eq!(buf, [0x34, 0x12, 0x00]);
    }

    #[test]
    fn test_injected_write_failure() {
        let mut bus = MockI2c::new();
        bus.fail_write_in(1);

        assert!(bus.write(0x70, &[0x01], Window::IMMEDIATE).is_ok());
        assert_eq!(
            bus.write(0x70, &[0x00], Window::IMMEDIATE),
            Err(MockI2cError::Injected)
        );
        // One-shot
        assert!(bus.write(0x70, &[0x00], Window::IMMEDIATE).is_ok());
        assert_eq!(bus.writes().count(), 2);
    }

    #[test]
    fn test_injected_read_failure() {
        let mut bus = MockI2c::new();
        bus.fail_next_read();
        let mut buf = [0u8; 1];

        assert_eq!(bus.read(0x4C, 0xFD, &mut buf), Err(MockI2cError::Injected));
        assert!(bus.read(0x4C, 0xFD, &mut buf).is_ok());
        assert_eq!(bus.ops().len(), 1);
    }
}
