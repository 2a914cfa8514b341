//! Fault classification
//!
//! Every driver error maps onto one of these classes, which decides what
//! the host does with it.

/// How a fault should be handled by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultClass {
    /// Bad setup; abort the configuration step, never retried
    Configuration,
    /// Caller broke a protocol invariant; a bug, always surfaced
    ProtocolViolation,
    /// The transport failed; propagated unchanged, retry is the transport's call
    Transport,
}

impl FaultClass {
    /// Check if the fault is raised while setting devices up
    pub fn is_setup_fault(&self) -> bool {
        matches!(self, FaultClass::Configuration)
    }

    /// Check if the fault indicates a caller bug
    pub fn is_caller_bug(&self) -> bool {
        matches!(self, FaultClass::ProtocolViolation)
    }
}
