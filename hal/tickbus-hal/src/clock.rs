//! MCU clock abstractions
//!
//! The host never talks to hardware "now". It converts its own notion of
//! time into MCU clock ticks and hands the transport a window of ticks in
//! which a command may run.

/// MCU clock tick
///
/// Monotonically increasing counter of the MCU's main oscillator.
pub type Tick = u64;

/// Scheduling window for a queued command
///
/// The transport must not execute the command before `not_before`, and
/// should execute it at `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Window {
    /// Earliest clock the command may run at
    pub not_before: Tick,
    /// Requested execution clock
    pub at: Tick,
}

impl Window {
    /// Run as soon as the transport gets to it
    pub const IMMEDIATE: Self = Self {
        not_before: 0,
        at: 0,
    };

    /// Create a window from its bounds
    pub const fn new(not_before: Tick, at: Tick) -> Self {
        Self { not_before, at }
    }
}

/// Host time source
///
/// Maps host time (seconds on the host's print-time axis) to the MCU clock.
pub trait ClockSource {
    /// Convert a host time in seconds to an MCU clock tick
    fn to_clock_tick(&self, time: f64) -> Tick;
}

/// Clock source for an MCU running at a fixed frequency with no drift
///
/// Negative times map to tick 0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedRateClock {
    /// Oscillator frequency in Hz
    pub frequency_hz: u32,
    /// Host time (seconds) that corresponds to tick 0
    pub epoch: f64,
}

impl FixedRateClock {
    /// Create a clock with tick 0 at host time 0
    pub const fn new(frequency_hz: u32) -> Self {
        Self {
            frequency_hz,
            epoch: 0.0,
        }
    }
}

impl ClockSource for FixedRateClock {
    fn to_clock_tick(&self, time: f64) -> Tick {
        // Float to int `as` saturates, so anything before the epoch is 0
        ((time - self.epoch) * self.frequency_hz as f64) as Tick
    }
}

impl<C: ClockSource + ?Sized> ClockSource for &C {
    fn to_clock_tick(&self, time: f64) -> Tick {
        (**self).to_clock_tick(time)
    }
}
