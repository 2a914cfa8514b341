//! Tickbus Hardware Abstraction Layer
//!
//! This crate defines the narrow interfaces the drivers consume from the
//! host: a transport that queues I2C traffic against MCU clock ticks, and a
//! time source that maps host time onto those ticks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tickbus-drivers (EMC2101, TCA9548A)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tickbus-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ MCU command   │       │ embedded-hal  │
//! │ queue (host)  │       │ BlockingI2c   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::ScheduledI2c`] - Clock-scheduled I2C writes, synchronous reads
//! - [`clock::ClockSource`] - Host time to MCU clock tick conversion

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod i2c;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use clock::{ClockSource, FixedRateClock, Tick, Window};
pub use i2c::{BlockingI2c, ScheduledI2c};
