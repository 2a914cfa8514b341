//! Virtual PWM pin contract
//!
//! The host's output pins (fans, heaters, LEDs) are driven through a generic
//! PWM pin interface. A device that can produce PWM itself, such as a fan
//! controller IC, implements [`PwmPin`] so the host can use it wherever a
//! real MCU pin would go.
//!
//! # Setup sequence
//!
//! ```text
//! validate pin request (pull-up, inversion)
//!   -> setup_max_duration()
//!   -> setup_cycle_time()
//!   -> setup_start_value()
//!   -> set_pwm() ... (runtime)
//! ```

use crate::config::ConfigError;

/// PWM duty cycle in `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyCycle(f32);

impl DutyCycle {
    /// Output off
    pub const OFF: Self = Self(0.0);

    /// Output fully on
    pub const FULL: Self = Self(1.0);

    /// Create a duty cycle, rejecting NaN and values outside `[0, 1]`
    pub fn new(value: f32) -> Option<Self> {
        if (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a duty cycle, clamping into `[0, 1]` (NaN becomes off)
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            Self::OFF
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Fraction of the period the output is on
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Quantize to `0..=max` steps, rounding half away from zero
    pub fn to_steps(&self, max: u8) -> u8 {
        // Exact in f64: a product rounded to f32 can land on .5 from below
        let scaled = self.0 as f64 * max as f64;
        let whole = scaled as u8;
        if scaled - whole as f64 >= 0.5 {
            whole + 1
        } else {
            whole
        }
    }

    /// Inverse of [`DutyCycle::to_steps`] (lossy)
    pub fn from_steps(steps: u8, max: u8) -> Self {
        if max == 0 {
            return Self::OFF;
        }
        Self::clamped(steps as f32 / max as f32)
    }
}

/// Generic PWM output pin as seen by the host
///
/// Setup methods are called once while the host configures its objects and
/// reject features the implementation cannot provide. `set_pwm` is the
/// runtime path.
pub trait PwmPin {
    /// Error type for runtime output changes
    type Error;

    /// Request an automatic cutoff after `max_duration` seconds without an update
    ///
    /// `0.0` means no cutoff.
    fn setup_max_duration(&mut self, max_duration: f32) -> Result<(), ConfigError>;

    /// Request a PWM period and whether it must be hardware generated
    fn setup_cycle_time(&mut self, cycle_time: f32, hardware_pwm: bool) -> Result<(), ConfigError>;

    /// Set the values applied when the host becomes ready and when it shuts down
    ///
    /// Values are clamped into `[0, 1]`.
    fn setup_start_value(&mut self, start_value: f32, shutdown_value: f32);

    /// Schedule a new duty cycle at host time `time` (seconds)
    fn set_pwm(&mut self, time: f64, value: f32) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(DutyCycle::new(0.0).is_some());
        assert!(DutyCycle::new(1.0).is_some());
        assert!(DutyCycle::new(-0.01).is_none());
        assert!(DutyCycle::new(1.01).is_none());
        assert!(DutyCycle::new(f32::NAN).is_none());
    }

    #[test]
    fn test_clamped() {
        assert_eq!(DutyCycle::clamped(1.5), DutyCycle::FULL);
        assert_eq!(DutyCycle::clamped(-2.0), DutyCycle::OFF);
        assert_eq!(DutyCycle::clamped(f32::NAN), DutyCycle::OFF);
        assert_eq!(DutyCycle::clamped(0.25).value(), 0.25);
    }

    #[test]
    fn test_to_steps_rounds() {
        assert_eq!(DutyCycle::OFF.to_steps(63), 0);
        assert_eq!(DutyCycle::FULL.to_steps(63), 63);
        // 63 * 0.5 = 31.5 rounds up
        assert_eq!(DutyCycle::clamped(0.5).to_steps(63), 32);
        // 63 * 0.1 = 6.3 rounds down
        assert_eq!(DutyCycle::clamped(0.1).to_steps(63), 6);
    }

    #[test]
    fn test_to_steps_just_below_half() {
        // 63 * 0.515873 is 32.49999994, which an f32 product rounds to 32.5
        assert_eq!(DutyCycle::clamped(0.515873).to_steps(63), 32);
    }

    /// Nearest step computed exactly
    fn nearest(value: f32, max: u8) -> u8 {
        (value as f64 * max as f64 + 0.5) as u8
    }

    #[test]
    fn test_to_steps_around_every_boundary() {
        for k in 0..63u32 {
            let boundary = ((k as f64 + 0.5) / 63.0) as f32;
            for offset in -4i32..=4 {
                let bits = (boundary.to_bits() as i32 + offset) as u32;
                let value = f32::from_bits(bits);
                assert_eq!(
                    DutyCycle::clamped(value).to_steps(63),
                    nearest(value, 63),
                    "value {value}"
                );
            }
        }
    }

    #[test]
    fn test_from_steps_is_lossy() {
        let duty = DutyCycle::clamped(0.5);
        let back = DutyCycle::from_steps(duty.to_steps(63), 63);

        assert_ne!(back, duty);
        assert_eq!(back.to_steps(63), 32);
        assert_eq!(DutyCycle::from_steps(5, 0), DutyCycle::OFF);
    }

    proptest! {
        #[test]
        fn prop_steps_are_nearest(value in 0.0f32..=1.0) {
            let steps = DutyCycle::clamped(value).to_steps(63);

            prop_assert!(steps <= 63);
            prop_assert_eq!(steps, nearest(value, 63));
        }
    }
}
