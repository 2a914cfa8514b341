//! Board-agnostic core logic for clock-scheduled I2C peripherals
//!
//! This crate contains the logic that does not depend on a specific
//! peripheral's register map:
//!
//! - Clock scheduling of ordered write streams
//! - Duty cycle values and the virtual PWM pin contract
//! - Lifecycle events delivered by the host
//! - Fault classification shared by all drivers
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod traits;

pub use error::FaultClass;
pub use tickbus_hal::{Tick, Window};
