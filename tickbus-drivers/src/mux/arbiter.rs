//! Channel arbitration for a 1-to-8 I2C multiplexer
//!
//! Every downstream device is claimed onto exactly one channel. At most one
//! channel is ever selected: opening a second channel before the first one
//! is closed is refused, and state only changes after the control write
//! was accepted by the transport.
//!
//! ```text
//!              open(id) ok
//!   Closed  ------------------>  Open      (active = id)
//!     ^                           |
//!     +---------------------------+
//!              close(id) ok                (active = None)
//! ```

use tickbus_core::config::{ConfigError, DeviceName, MUX_CHANNELS};
use tickbus_core::FaultClass;
use tickbus_hal::{ScheduledI2c, Window};

/// Identifier of a device claimed onto a channel
pub type DeviceId = DeviceName;

/// Control byte that deselects every channel
pub const DESELECT_ALL: u8 = 0x00;

const CHANNEL_COUNT: usize = MUX_CHANNELS as usize;

/// Multiplexer errors raised while devices use their channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MuxError<E> {
    /// Another channel is still open (or the multiplexer is mid-transaction)
    ChannelBusy,
    /// Closing a channel that is not the active one
    NotActive,
    /// Device was never claimed on this multiplexer
    UnknownDevice,
    /// Transport failure, passed through unchanged
    Bus(E),
}

impl<E> MuxError<E> {
    /// Fault class of the error
    pub fn class(&self) -> FaultClass {
        match self {
            MuxError::Bus(_) => FaultClass::Transport,
            MuxError::ChannelBusy | MuxError::NotActive | MuxError::UnknownDevice => {
                FaultClass::ProtocolViolation
            }
        }
    }
}

/// Selection state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Deselected
    #[default]
    Closed,
    /// Routed to the upstream bus
    Open,
}

/// One downstream channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    index: u8,
    device: Option<DeviceId>,
    state: ChannelState,
}

impl Channel {
    const fn unclaimed(index: u8) -> Self {
        Self {
            index,
            device: None,
            state: ChannelState::Closed,
        }
    }

    /// Channel number (0-7)
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Device claimed onto the channel
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Whether the channel is currently selected
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Control byte selecting only this channel
    pub fn select_mask(&self) -> u8 {
        1 << self.index
    }
}

/// Proof that a device owns a channel, returned by [`ChannelArbiter::claim`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelHandle {
    index: u8,
    device: DeviceId,
}

impl ChannelHandle {
    /// Claimed channel number
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Device that made the claim
    pub fn device(&self) -> &str {
        &self.device
    }

    pub(crate) fn device_id(&self) -> &DeviceId {
        &self.device
    }
}

/// Channel table and selection state of one multiplexer
#[derive(Debug, Clone)]
pub struct ChannelArbiter {
    address: u8,
    channels: [Channel; CHANNEL_COUNT],
    /// Index of the open channel; set iff exactly one channel is Open
    active: Option<u8>,
}

impl ChannelArbiter {
    /// Create an arbiter for the multiplexer at `address`, all channels free
    pub fn new(address: u8) -> Self {
        Self {
            address,
            channels: core::array::from_fn(|i| Channel::unclaimed(i as u8)),
            active: None,
        }
    }

    /// Multiplexer bus address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Assign `device` to channel `index`
    ///
    /// Configuration time only; no bus traffic.
    pub fn claim(&mut self, index: u8, device: DeviceId) -> Result<ChannelHandle, ConfigError> {
        let slot = self
            .channels
            .get(index as usize)
            .ok_or(ConfigError::InvalidChannel(index))?;
        if slot.device.is_some() {
            return Err(ConfigError::ChannelTaken(index));
        }
        if self.lookup(&device).is_some() {
            return Err(ConfigError::DuplicateName);
        }

        self.channels[index as usize].device = Some(device.clone());
        Ok(ChannelHandle { index, device })
    }

    /// Select the channel of `device`
    ///
    /// Fails without touching the bus if any channel is already open.
    /// State is unchanged if the control write fails.
    pub fn open<B: ScheduledI2c>(
        &mut self,
        bus: &mut B,
        device: &str,
        window: Window,
    ) -> Result<u8, MuxError<B::Error>> {
        if self.active.is_some() {
            return Err(MuxError::ChannelBusy);
        }
        let index = self.lookup(device).ok_or(MuxError::UnknownDevice)?;
        let channel = &mut self.channels[index as usize];

        bus.write(self.address, &[channel.select_mask()], window)
            .map_err(MuxError::Bus)?;

        channel.state = ChannelState::Open;
        self.active = Some(index);
        Ok(index)
    }

    /// Deselect all channels, ending `device`'s transaction
    ///
    /// Fails unless `device` holds the open channel. If the control write
    /// fails the channel stays active, since the hardware may still route it.
    pub fn close<B: ScheduledI2c>(
        &mut self,
        bus: &mut B,
        device: &str,
        window: Window,
    ) -> Result<(), MuxError<B::Error>> {
        let index = match self.active {
            Some(index) if self.channels[index as usize].device() == Some(device) => index,
            _ => return Err(MuxError::NotActive),
        };

        bus.write(self.address, &[DESELECT_ALL], window)
            .map_err(MuxError::Bus)?;

        self.channels[index as usize].state = ChannelState::Closed;
        self.active = None;
        Ok(())
    }

    /// Device holding the open channel
    pub fn active(&self) -> Option<&str> {
        self.active
            .and_then(|index| self.channels[index as usize].device())
    }

    /// Index of the open channel
    pub fn active_index(&self) -> Option<u8> {
        self.active
    }

    /// Channel `index`, or `None` past the last channel
    pub fn channel(&self, index: u8) -> Option<&Channel> {
        self.channels.get(index as usize)
    }

    /// All eight channels in index order
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    fn lookup(&self, device: &str) -> Option<u8> {
        self.channels
            .iter()
            .find(|c| c.device() == Some(device))
            .map(|c| c.index)
    }
}
