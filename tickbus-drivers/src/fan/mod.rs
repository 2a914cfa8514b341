//! Fan control
//!
//! Drivers for I2C fan controllers and the adapters exposing them to the
//! host as generic outputs.

pub mod emc2101;
pub mod pwm;
pub mod registers;

pub use emc2101::{Emc2101, FanError, InitReport};
pub use pwm::Emc2101Pwm;
pub use registers::{ChipIdentity, Status, TachReading};
