//! Lifecycle events delivered by the host

/// Host lifecycle events that drive default outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleEvent {
    /// The MCU connection is up and devices were configured
    Ready,
    /// The host is shutting down (or entering its shutdown state)
    Shutdown,
}

impl LifecycleEvent {
    /// Check if this event ends normal operation
    pub fn is_shutdown(&self) -> bool {
        matches!(self, LifecycleEvent::Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_event() {
        assert!(LifecycleEvent::Shutdown.is_shutdown());
        assert!(!LifecycleEvent::Ready.is_shutdown());
    }
}
