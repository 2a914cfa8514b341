//! I2C transport abstractions
//!
//! Writes are queued against the MCU clock and only guaranteed to execute
//! no earlier than their window's `not_before` tick, in submission order.
//! Reads are synchronous request/response exchanges.

use crate::clock::Window;

/// Clock-scheduled I2C master
///
/// Implemented by the host's MCU command queue, by [`BlockingI2c`] for
/// bench use, and by multiplexed channels that forward to a parent bus.
pub trait ScheduledI2c {
    /// Error type for I2C operations
    type Error;

    /// Queue a write to a device
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write (register address first, where applicable)
    /// * `window` - Clock window the write may execute in
    fn write(&mut self, address: u8, data: &[u8], window: Window) -> Result<(), Self::Error>;

    /// Read `buf.len()` bytes starting at `register`
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `register` - First register to read
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Read a register, clear then set bits, and write it back
    ///
    /// Returns the value written.
    fn modify_bits(
        &mut self,
        address: u8,
        register: u8,
        clear: u8,
        set: u8,
        window: Window,
    ) -> Result<u8, Self::Error> {
        let mut buf = [0u8];
        self.read(address, register, &mut buf)?;
        let value = (buf[0] & !clear) | set;
        self.write(address, &[register, value], window)?;
        Ok(value)
    }
}

impl<T: ScheduledI2c + ?Sized> ScheduledI2c for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8], window: Window) -> Result<(), Self::Error> {
        (**self).write(address, data, window)
    }

    fn read(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(address, register, buf)
    }

    fn modify_bits(
        &mut self,
        address: u8,
        register: u8,
        clear: u8,
        set: u8,
        window: Window,
    ) -> Result<u8, Self::Error> {
        (**self).modify_bits(address, register, clear, set, window)
    }
}

/// Immediate transport over a blocking `embedded-hal` I2C bus
///
/// Every write executes as soon as it is submitted and the window is
/// ignored, so ordering is exactly submission order. Suitable for bench
/// setups where the host drives the bus directly.
pub struct BlockingI2c<I> {
    i2c: I,
}

impl<I> BlockingI2c<I> {
    /// Wrap a blocking I2C bus
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Release the underlying bus
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: embedded_hal::i2c::I2c> ScheduledI2c for BlockingI2c<I> {
    type Error = I::Error;

    fn write(&mut self, address: u8, data: &[u8], _window: Window) -> Result<(), Self::Error> {
        self.i2c.write(address, data)
    }

    fn read(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        // Repeated start: register pointer write then read
        self.i2c.write_read(address, &[register], buf)
    }
}
