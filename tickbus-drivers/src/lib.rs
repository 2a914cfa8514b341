//! Hardware driver implementations
//!
//! This crate provides drivers for the I2C peripherals on top of the
//! scheduled transport defined in tickbus-hal:
//!
//! - Fan control (EMC2101 register model, fan controller, PWM pin adapter)
//! - Bus multiplexing (TCA9548A channel arbiter and multiplexed channels)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

pub mod fan;
pub mod mux;
