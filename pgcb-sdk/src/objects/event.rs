//! Domain events published after a callback changes an order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signature::Signature;

/// Name under which a callback event is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallbackEventName {
    #[serde(rename = "pgcb_payment_completed")]
    Completed,
    #[serde(rename = "pgcb_payment_failed")]
    Failed,
}

impl CallbackEventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackEventName::Completed => "pgcb_payment_completed",
            CallbackEventName::Failed => "pgcb_payment_failed",
        }
    }
}

impl std::fmt::Display for CallbackEventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by both callback events.
///
/// Downstream consumers read the gateway reference from
/// `merchant_reference` and the merchant reference from `quote`. Keep the
/// pairing as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEventPayload {
    pub quote: String,
    pub merchant_reference: String,
    pub transaction_type: String,
    pub result: String,
}

/// Envelope POSTed to the downstream event endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedEvent {
    pub event_id: Uuid,
    pub event: CallbackEventName,
    pub payload: CallbackEventPayload,
    pub timestamp: i64,
}

impl Signature for ForwardedEvent {}
