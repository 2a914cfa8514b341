//! Clock scheduler
//!
//! Hands out scheduling windows for a single ordered write stream.

pub mod clock;

pub use clock::ClockScheduler;
