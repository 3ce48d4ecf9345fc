//! Background processors.
//!
//! - `EventForwarder`: receives `CallbackEvent`, delivers it downstream

pub mod event_forwarder;

pub use event_forwarder::{EventForwarder, ForwardError, ShutdownReport};
