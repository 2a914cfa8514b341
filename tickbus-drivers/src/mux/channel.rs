//! Transport for a device behind a multiplexer channel
//!
//! [`MuxChannel`] implements [`ScheduledI2c`], so a device driver can sit
//! behind a TCA9548A without knowing it. Every operation is bracketed by a
//! select/deselect of the device's channel. Several channels share one
//! multiplexer through a `RefCell`; a borrow that is already taken (a
//! transaction started from inside another) is reported as
//! [`MuxError::ChannelBusy`].

use core::cell::RefCell;

use tickbus_hal::{ScheduledI2c, Window};

use super::arbiter::{ChannelHandle, MuxError};
use super::tca9548a::Tca9548a;

/// One device's view of a shared multiplexer
pub struct MuxChannel<'m, B> {
    mux: &'m RefCell<Tca9548a<B>>,
    handle: ChannelHandle,
}

impl<'m, B: ScheduledI2c> MuxChannel<'m, B> {
    /// Bind a claimed channel to its multiplexer
    pub fn new(mux: &'m RefCell<Tca9548a<B>>, handle: ChannelHandle) -> Self {
        Self { mux, handle }
    }

    /// Channel this view routes to
    pub fn handle(&self) -> &ChannelHandle {
        &self.handle
    }

    /// Run `op` with this channel selected
    ///
    /// Select and deselect are queued with `window`.
    pub fn transact<T>(
        &self,
        window: Window,
        op: impl FnOnce(&mut B) -> Result<T, B::Error>,
    ) -> Result<T, MuxError<B::Error>> {
        let mut mux = self.mux.try_borrow_mut().map_err(|_| MuxError::ChannelBusy)?;
        mux.transact(&self.handle, window, op)
    }
}

impl<B: ScheduledI2c> ScheduledI2c for MuxChannel<'_, B> {
    type Error = MuxError<B::Error>;

    fn write(&mut self, address: u8, data: &[u8], window: Window) -> Result<(), Self::Error> {
        self.transact(window, |bus| bus.write(address, data, window))
    }

    fn read(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.transact(Window::IMMEDIATE, |bus| bus.read(address, register, buf))
    }

    // One select/deselect around both halves, so no other channel can be
    // selected between the read and the write-back
    fn modify_bits(
        &mut self,
        address: u8,
        register: u8,
        clear: u8,
        set: u8,
        window: Window,
    ) -> Result<u8, Self::Error> {
        self.transact(window, |bus| bus.modify_bits(address, register, clear, set, window))
    }
}
