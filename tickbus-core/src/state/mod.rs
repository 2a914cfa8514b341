//! Host lifecycle state
//!
//! The host decides when a device becomes ready or shuts down; the core only
//! reacts to the events it is handed.

pub mod events;

pub use events::LifecycleEvent;
