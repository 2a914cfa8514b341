//! Configuration types
//!
//! Board-level description of the I2C peripherals, optionally stored as
//! postcard binary data.

#[cfg(feature = "serde")]
pub mod persist;
pub mod types;

pub use types::*;
