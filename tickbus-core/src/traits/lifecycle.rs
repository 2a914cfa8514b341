//! Lifecycle hook trait

use tickbus_hal::Tick;

use crate::state::LifecycleEvent;

/// Device that applies configured outputs on host lifecycle events
///
/// The host owns the decision of *when* an event fires; implementations
/// only decide what to queue in response, scheduled at `clock`.
pub trait LifecycleHooks {
    /// Error type for the queued commands
    type Error;

    /// React to a lifecycle event
    fn handle_event(&mut self, event: LifecycleEvent, clock: Tick) -> Result<(), Self::Error>;
}
