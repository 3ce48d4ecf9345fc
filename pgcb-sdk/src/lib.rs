//! Wire objects and signature helpers shared by the pgcb crates.
//!
//! - [`objects`] holds everything that crosses a network boundary: the
//!   gateway notification, the callback response envelope, and the events
//!   published to downstream consumers.
//! - [`signature`] implements the gateway HMAC scheme and the signed
//!   envelope used when forwarding events.

pub mod objects;
pub mod signature;
