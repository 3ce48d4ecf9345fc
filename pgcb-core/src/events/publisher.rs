//! Publishing side of the event bus.

use tokio::sync::mpsc::error::TrySendError;

use super::channels::CallbackEventSender;
use super::types::CallbackEvent;

#[derive(Debug, thiserror::Error)]
pub enum EventDispatchError {
    #[error("event channel is full")]
    Full,
    #[error("event channel is closed")]
    Closed,
}

/// Fire-and-forget event dispatch. Implementations must not block.
pub trait EventPublisher: Send + Sync {
    fn dispatch(&self, event: CallbackEvent) -> Result<(), EventDispatchError>;
}

/// Publishes onto the channel drained by the `EventForwarder`.
#[derive(Clone)]
pub struct ChannelEventPublisher {
    sender: CallbackEventSender,
}

impl ChannelEventPublisher {
    pub fn new(sender: CallbackEventSender) -> Self {
        Self { sender }
    }
}

impl EventPublisher for ChannelEventPublisher {
    fn dispatch(&self, event: CallbackEvent) -> Result<(), EventDispatchError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => EventDispatchError::Full,
            TrySendError::Closed(_) => EventDispatchError::Closed,
        })
    }
}
