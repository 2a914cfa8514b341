//! Monotonic clock scheduling for a write stream
//!
//! Each write in a stream is queued with the previous write's clock as its
//! lower bound. The MCU queue then cannot run a write before the one issued
//! ahead of it, even when the two were submitted out of wall-clock order.
//!
//! ```text
//! schedule(100) -> Window { not_before:   0, at: 100 }
//! schedule(250) -> Window { not_before: 100, at: 250 }
//! schedule(250) -> Window { not_before: 250, at: 250 }
//! ```

use tickbus_hal::{Tick, Window};

/// Bound tracker for one logical write stream
///
/// The requested clock itself is not checked: the host's time source is
/// monotonic, and the scheduler only has to chain each write to the last.
#[derive(Debug, Clone, Default)]
pub struct ClockScheduler {
    /// Clock of the most recently scheduled write (0 = none yet)
    last_clock: Tick,
}

impl ClockScheduler {
    /// Create a scheduler with no prior constraint
    pub const fn new() -> Self {
        Self { last_clock: 0 }
    }

    /// Schedule a write at `requested` and advance the bound to it
    pub fn schedule(&mut self, requested: Tick) -> Window {
        let window = Window::new(self.last_clock, requested);
        self.last_clock = requested;
        window
    }

    /// Clock of the most recently scheduled write
    pub fn last_clock(&self) -> Tick {
        self.last_clock
    }
}
