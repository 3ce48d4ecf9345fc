//! Event channel factory and handles.

use super::types::CallbackEvent;
use tokio::sync::mpsc;

/// Buffer size of the callback event channel.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

pub type CallbackEventSender = mpsc::Sender<CallbackEvent>;
pub type CallbackEventReceiver = mpsc::Receiver<CallbackEvent>;

/// Create the channel between the publisher and the forwarder.
pub fn callback_event_channel() -> (CallbackEventSender, CallbackEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
