//! Device-facing traits
//!
//! These traits define the contracts the host drives devices through,
//! independent of any particular peripheral.

pub mod lifecycle;
pub mod pwm;

pub use lifecycle::LifecycleHooks;
pub use pwm::{DutyCycle, PwmPin};
