//! Domain events emitted after a callback changes an order.
//!
//! # Event Flow
//!
//! 1. `CallbackHandler` builds a `CallbackEvent` and hands it to an
//!    `EventPublisher` (fire-and-forget).
//! 2. `ChannelEventPublisher` pushes it onto a bounded mpsc channel.
//! 3. `EventForwarder` drains the channel and delivers each event
//!    downstream.

pub mod channels;
pub mod publisher;
pub mod types;

pub use channels::{
    CallbackEventReceiver, CallbackEventSender, DEFAULT_CHANNEL_BUFFER, callback_event_channel,
};
pub use publisher::{ChannelEventPublisher, EventDispatchError, EventPublisher};
pub use types::CallbackEvent;
