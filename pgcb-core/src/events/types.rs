//! Event type definitions.

use pgcb_sdk::objects::{CallbackEventName, CallbackEventPayload, Notification};

/// A `completed` or `failed` event for one callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    pub name: CallbackEventName,
    pub payload: CallbackEventPayload,
}

impl CallbackEvent {
    /// Build the event published for `notification`.
    ///
    /// `quote` carries the merchant reference and `merchant_reference`
    /// carries the gateway reference; consumers rely on that mapping.
    pub fn from_notification(notification: &Notification, completed: bool) -> Self {
        let name = if completed {
            CallbackEventName::Completed
        } else {
            CallbackEventName::Failed
        };
        Self {
            name,
            payload: CallbackEventPayload {
                quote: notification.merchant_reference.clone(),
                merchant_reference: notification.gateway_reference.clone(),
                transaction_type: notification.transaction_type.clone(),
                result: notification.result.clone(),
            },
        }
    }
}
