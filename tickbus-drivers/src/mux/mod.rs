//! I2C bus multiplexing
//!
//! A TCA9548A splits one upstream bus into eight channels, letting
//! devices with the same fixed address (every EMC2101 sits at 0x4C)
//! share a bus.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ Emc2101<...> │   │ Emc2101<...> │
//! └──────┬───────┘   └──────┬───────┘
//!        │ MuxChannel (ch 0) │ MuxChannel (ch 3)
//!        └─────────┬─────────┘
//!        RefCell<Tca9548a<B>>  (ChannelArbiter: one channel open at a time)
//!                  │
//!            upstream bus B
//! ```

pub mod arbiter;
pub mod channel;
pub mod tca9548a;

pub use arbiter::{Channel, ChannelArbiter, ChannelHandle, ChannelState, DeviceId, MuxError};
pub use channel::MuxChannel;
pub use tca9548a::{ChannelGuard, Tca9548a};
