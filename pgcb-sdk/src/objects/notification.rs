//! The gateway notification as it arrives on the wire.
//!
//! Every field is kept as the exact string the gateway sent. Amounts and
//! timestamps in particular are never parsed, so the canonical field
//! mapping used for the HMAC matches the sender byte for byte.

use serde::{Deserialize, Serialize};

pub const MERCHANT_ID: &str = "merchant_id";
pub const AMOUNT: &str = "amount";
pub const CURRENCY: &str = "currency";
pub const MERCHANT_REFERENCE: &str = "merchant_reference";
pub const GATEWAY_REFERENCE: &str = "gateway_reference";
pub const PROMOTION_REFERENCE: &str = "promotion_reference";
pub const RESULT: &str = "result";
pub const TRANSACTION_TYPE: &str = "transaction_type";
pub const TEST: &str = "test";
pub const MESSAGE: &str = "message";
pub const TIMESTAMP: &str = "timestamp";
pub const SIGNATURE: &str = "signature";

/// Currencies the gateway is allowed to settle in.
pub const SUPPORTED_CURRENCIES: &[&str] = &["AUD", "NZD"];

/// A payment outcome notification, minus its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub merchant_id: String,
    pub amount: String,
    pub currency: String,
    /// The merchant's own order identifier.
    pub merchant_reference: String,
    /// The gateway's transaction identifier.
    pub gateway_reference: String,
    pub promotion_reference: String,
    pub result: String,
    pub transaction_type: String,
    pub test: String,
    pub message: String,
    pub timestamp: String,
}

impl Notification {
    /// The canonical field mapping, in the order the gateway signs it.
    ///
    /// The signature itself is never part of this mapping.
    pub fn fields(&self) -> [(&'static str, &str); 11] {
        [
            (MERCHANT_ID, &self.merchant_id),
            (AMOUNT, &self.amount),
            (CURRENCY, &self.currency),
            (MERCHANT_REFERENCE, &self.merchant_reference),
            (GATEWAY_REFERENCE, &self.gateway_reference),
            (PROMOTION_REFERENCE, &self.promotion_reference),
            (RESULT, &self.result),
            (TRANSACTION_TYPE, &self.transaction_type),
            (TEST, &self.test),
            (MESSAGE, &self.message),
            (TIMESTAMP, &self.timestamp),
        ]
    }
}

/// The full inbound callback: the notification fields plus the signature
/// the gateway computed over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRequest {
    #[serde(flatten)]
    pub notification: Notification,
    pub signature: String,
}

impl CallbackRequest {
    /// Split the request into the canonical notification and its signature.
    pub fn into_parts(self) -> (Notification, String) {
        (self.notification, self.signature)
    }
}

/// Outcome reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionResult {
    Completed,
    Failed,
}

impl TransactionResult {
    /// Parse the wire value. Matching is exact; `completed` is not accepted.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "COMPLETED" => Some(TransactionResult::Completed),
            "FAILED" => Some(TransactionResult::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionResult::Completed => "COMPLETED",
            TransactionResult::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for TransactionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of transaction the notification refers to. Only sales exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Sale,
}

impl TransactionType {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "SALE" => Some(TransactionType::Sale),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "SALE",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
