//! Response bodies returned to the gateway.

use serde::{Deserialize, Serialize};

/// The single entry of a [`CallbackResult`].
///
/// `merchant_id`, `gateway_reference`, `promotion_reference` and `amount`
/// are always copied verbatim from the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResultEntry {
    pub message: String,
    pub merchant_id: String,
    pub gateway_reference: String,
    pub promotion_reference: String,
    pub order_reference: String,
    pub amount: String,
}

/// Success-shaped callback response: always a one-element JSON list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResult(pub [CallbackResultEntry; 1]);

impl CallbackResult {
    pub fn new(entry: CallbackResultEntry) -> Self {
        Self([entry])
    }

    pub fn entry(&self) -> &CallbackResultEntry {
        &self.0[0]
    }
}

/// Body of a rejected callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
