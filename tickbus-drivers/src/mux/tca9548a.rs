//! TCA9548A 1-to-8 I2C multiplexer
//!
//! The TCA9548A has a single control register written without a register
//! address: bit N set routes the upstream bus to channel N. This driver
//! only ever sets one bit, and wraps every downstream transaction in a
//! select/deselect pair held by a [`ChannelGuard`].
//!
//! ```text
//! write(mux, [1 << ch])   select
//! ... device traffic ...
//! write(mux, [0x00])      deselect (on release or drop)
//! ```

use tickbus_core::config::{ConfigError, DeviceName, Tca9548aConfig};
use tickbus_hal::{ScheduledI2c, Window};

use super::arbiter::{ChannelArbiter, ChannelHandle, DeviceId, MuxError};

/// TCA9548A driver owning the upstream bus
pub struct Tca9548a<B> {
    bus: B,
    name: DeviceName,
    arbiter: ChannelArbiter,
}

impl<B: ScheduledI2c> Tca9548a<B> {
    /// Create a driver with no channels claimed
    pub fn new(bus: B, name: DeviceName, address: u8) -> Self {
        Self {
            bus,
            name,
            arbiter: ChannelArbiter::new(address),
        }
    }

    /// Create a driver from its configuration section
    pub fn from_config(bus: B, config: &Tca9548aConfig) -> Result<Self, ConfigError> {
        config.i2c.validate()?;
        if config.i2c.mux.is_some() {
            return Err(ConfigError::NestedMux);
        }
        Ok(Self::new(bus, config.name.clone(), config.i2c.address))
    }

    /// Assign `device` to channel `index`
    pub fn claim(&mut self, index: u8, device: DeviceId) -> Result<ChannelHandle, ConfigError> {
        self.arbiter.claim(index, device)
    }

    /// Select a claimed channel
    ///
    /// The returned guard deselects it again when released or dropped. Both
    /// control writes are queued with `window`.
    pub fn open(
        &mut self,
        channel: &ChannelHandle,
        window: Window,
    ) -> Result<ChannelGuard<'_, B>, MuxError<B::Error>> {
        self.arbiter.open(&mut self.bus, channel.device(), window)?;
        Ok(ChannelGuard {
            mux: self,
            device: channel.device_id().clone(),
            window,
            armed: true,
        })
    }

    /// Deselect `channel` outside of a guard
    ///
    /// Retries the deselect after a [`ChannelGuard`] failed to write it, which
    /// leaves the channel active and every other channel refused as busy.
    pub fn close(
        &mut self,
        channel: &ChannelHandle,
        window: Window,
    ) -> Result<(), MuxError<B::Error>> {
        self.arbiter.close(&mut self.bus, channel.device(), window)
    }

    /// Run `op` on the bus with `channel` selected
    ///
    /// The channel is deselected whether or not `op` succeeds. A failing
    /// `op` is reported in preference to a failing deselect.
    pub fn transact<T>(
        &mut self,
        channel: &ChannelHandle,
        window: Window,
        op: impl FnOnce(&mut B) -> Result<T, B::Error>,
    ) -> Result<T, MuxError<B::Error>> {
        let mut guard = self.open(channel, window)?;
        let value = op(guard.bus()).map_err(MuxError::Bus)?;
        guard.release()?;
        Ok(value)
    }

    /// Configured device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 7-bit bus address
    pub fn address(&self) -> u8 {
        self.arbiter.address()
    }

    /// Channel table and selection state
    pub fn arbiter(&self) -> &ChannelArbiter {
        &self.arbiter
    }

    /// Upstream bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Raw upstream bus; traffic sent here bypasses channel selection
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the upstream bus
    pub fn release(self) -> B {
        self.bus
    }
}

/// Scoped channel selection
///
/// While the guard lives its channel is the only one selected. Dropping it
/// deselects the channel; use [`ChannelGuard::release`] to observe a
/// failing deselect instead of having it logged.
pub struct ChannelGuard<'m, B: ScheduledI2c> {
    mux: &'m mut Tca9548a<B>,
    device: DeviceId,
    window: Window,
    armed: bool,
}

impl<B: ScheduledI2c> ChannelGuard<'_, B> {
    /// Upstream bus, routed to the selected channel
    pub fn bus(&mut self) -> &mut B {
        &mut self.mux.bus
    }

    /// Device whose channel is selected
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Deselect the channel now
    ///
    /// On failure the channel stays active in the arbiter.
    pub fn release(mut self) -> Result<(), MuxError<B::Error>> {
        self.armed = false;
        let mux = &mut *self.mux;
        mux.arbiter.close(&mut mux.bus, &self.device, self.window)
    }
}

impl<B: ScheduledI2c> Drop for ChannelGuard<'_, B> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mux = &mut *self.mux;
        if mux.arbiter.close(&mut mux.bus, &self.device, self.window).is_err() {
            log_error!(
                "tca9548a {}: failed to deselect channel of {}",
                mux.name.as_str(),
                self.device.as_str()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;
    use std::vec::Vec;
    use tickbus_core::config::{device_name, I2cDeviceConfig, MuxBinding};
    use tickbus_hal::mock::{I2cOp, MockI2c, MockI2cError};

    const MUX: u8 = 0x70;
    const FAN: u8 = 0x4C;

    fn mux() -> (Tca9548a<MockI2c>, ChannelHandle, ChannelHandle) {
        let mut mux = Tca9548a::new(MockI2c::new(), device_name("hub").unwrap(), MUX);
        let a = mux.claim(0, device_name("a").unwrap()).unwrap();
        let b = mux.claim(3, device_name("b").unwrap()).unwrap();
        (mux, a, b)
    }

    fn wire(mux: &Tca9548a<MockI2c>) -> Vec<(u8, Vec<u8>)> {
        mux.bus()
            .writes()
            .map(|(address, data, _)| (address, data.to_vec()))
            .collect()
    }

    #[test]
    fn test_guard_brackets_traffic() {
        let (mut mux, a, _) = mux();
        let window = Window::new(5, 9);

        {
            let mut guard = mux.open(&a, window).unwrap();
            guard.bus().write(FAN, &[0x4C, 10], window).unwrap();
            guard.release().unwrap();
        }

        assert_eq!(
            wire(&mux),
            [(MUX, vec![0x01]), (FAN, vec![0x4C, 10]), (MUX, vec![0x00])]
        );
        assert!(mux.bus().writes().all(|(_, _, w)| w == window));
        assert_eq!(mux.arbiter().active(), None);
    }

    #[test]
    fn test_drop_deselects() {
        let (mut mux, _, b) = mux();

        {
            let guard = mux.open(&b, Window::IMMEDIATE).unwrap();
            assert_eq!(guard.device(), "b");
        }

        assert_eq!(wire(&mux), [(MUX, vec![0b0000_1000]), (MUX, vec![0x00])]);
        assert_eq!(mux.arbiter().active(), None);
    }

    #[test]
    fn test_failed_op_still_deselects() {
        let (mut mux, a, _) = mux();
        // select ok, device write fails
        mux.bus_mut().fail_write_in(1);

        let result = mux.transact(&a, Window::IMMEDIATE, |bus| {
            bus.write(FAN, &[0x4C, 1], Window::IMMEDIATE)
        });

        assert_eq!(result, Err(MuxError::Bus(MockI2cError::Injected)));
        assert_eq!(wire(&mux), [(MUX, vec![0x01]), (MUX, vec![0x00])]);
        assert_eq!(mux.arbiter().active(), None);
    }

    #[test]
    fn test_failed_read_still_deselects() {
        let (mut mux, a, _) = mux();
        mux.bus_mut().fail_next_read();

        let result = mux.transact(&a, Window::IMMEDIATE, |bus| {
            let mut buf = [0u8];
            bus.read(FAN, 0xFD, &mut buf).map(|_| buf[0])
        });

        assert!(result.is_err());
        assert_eq!(mux.arbiter().active(), None);
        assert!(matches!(mux.bus().ops().last(), Some(I2cOp::Write { address: MUX, .. })));
    }

    #[test]
    fn test_transact_returns_value() {
        let (mut mux, _, b) = mux();
        mux.bus_mut().set_register(FAN, 0xFD, 0x16).unwrap();

        let id = mux
            .transact(&b, Window::IMMEDIATE, |bus| {
                let mut buf = [0u8];
                bus.read(FAN, 0xFD, &mut buf).map(|_| buf[0])
            })
            .unwrap();

        assert_eq!(id, 0x16);
    }

    #[test]
    fn test_failed_deselect_on_release() {
        let (mut mux, a, b) = mux();
        // select ok, deselect fails
        mux.bus_mut().fail_write_in(1);

        let guard = mux.open(&a, Window::IMMEDIATE).unwrap();
        assert_eq!(guard.release(), Err(MuxError::Bus(MockI2cError::Injected)));

        // Still routed to channel 0; nothing else may open
        assert_eq!(mux.arbiter().active(), Some("a"));
        assert_eq!(mux.open(&b, Window::IMMEDIATE).err(), Some(MuxError::ChannelBusy));
    }

    #[test]
    fn test_close_recovers_after_failed_deselect() {
        let (mut mux, a, b) = mux();
        mux.bus_mut().fail_write_in(1);
        let guard = mux.open(&a, Window::IMMEDIATE).unwrap();
        assert!(guard.release().is_err());

        // Only the holder can close
        assert_eq!(mux.close(&b, Window::IMMEDIATE), Err(MuxError::NotActive));
        mux.close(&a, Window::IMMEDIATE).unwrap();

        assert_eq!(mux.arbiter().active(), None);
        mux.transact(&b, Window::IMMEDIATE, |bus| {
            bus.write(FAN, &[0x4C, 2], Window::IMMEDIATE)
        })
        .unwrap();
        assert_eq!(
            wire(&mux),
            [
                (MUX, vec![0x01]),
                (MUX, vec![0x00]),
                (MUX, vec![0x08]),
                (FAN, vec![0x4C, 2]),
                (MUX, vec![0x00]),
            ]
        );
    }

    #[test]
    fn test_failed_select() {
        let (mut mux, a, _) = mux();
        mux.bus_mut().fail_write_in(0);

        assert_eq!(
            mux.open(&a, Window::IMMEDIATE).err(),
            Some(MuxError::Bus(MockI2cError::Injected))
        );
        assert_eq!(mux.arbiter().active(), None);
        assert!(mux.bus().ops().is_empty());
    }

    #[test]
    fn test_handle_from_other_mux_is_unknown() {
        let (mut mux, _, _) = mux();
        let mut other = Tca9548a::new(MockI2c::new(), device_name("hub2").unwrap(), 0x71);
        let stranger = other.claim(1, device_name("c").unwrap()).unwrap();

        assert_eq!(
            mux.open(&stranger, Window::IMMEDIATE).err(),
            Some(MuxError::UnknownDevice)
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = Tca9548aConfig {
            name: device_name("hub").unwrap(),
            ..Default::default()
        };
        config.i2c.address = 0x74;

        let mux = Tca9548a::from_config(MockI2c::new(), &config).unwrap();
        assert_eq!(mux.address(), 0x74);
        assert_eq!(mux.name(), "hub");

        config.i2c = I2cDeviceConfig {
            mux: Some(MuxBinding {
                mux: device_name("root").unwrap(),
                channel: 0,
            }),
            ..I2cDeviceConfig::new(0x70)
        };
        assert_eq!(
            Tca9548a::from_config(MockI2c::new(), &config).err(),
            Some(ConfigError::NestedMux)
        );
    }
}
