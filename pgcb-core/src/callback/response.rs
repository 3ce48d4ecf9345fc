//! Response envelope and error shaping.

use pgcb_sdk::objects::{CallbackResult, CallbackResultEntry, Notification};

use super::reconciler::{ReconcileOutcome, ReconcileResult};
use super::validator::ValidationError;
use crate::store::OrderStoreError;

/// A rejected callback. Every variant is a client error towards the gateway.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Validation failed with error: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Reconciliation(#[from] OrderStoreError),
}

impl CallbackError {
    /// HTTP status returned for every rejected callback.
    pub const STATUS_CODE: u16 = 400;

    /// The only text the gateway gets to see.
    pub fn external_message(&self) -> String {
        format!("Bad Request - {self}")
    }
}

/// Build the success-shaped envelope for a reconciled callback.
pub fn build_result(notification: &Notification, reconciled: &ReconcileResult) -> CallbackResult {
    let message = match reconciled.outcome {
        ReconcileOutcome::Failed => format!("Failed order {}", reconciled.order_reference),
        ReconcileOutcome::Created => format!("Created order {}", reconciled.order_reference),
        ReconcileOutcome::IgnoredDuplicate => format!(
            "Created order (ignored state change) {}",
            reconciled.order_reference
        ),
    };

    CallbackResult::new(CallbackResultEntry {
        message,
        merchant_id: notification.merchant_id.clone(),
        gateway_reference: notification.gateway_reference.clone(),
        promotion_reference: notification.promotion_reference.clone(),
        order_reference: reconciled.order_reference.clone(),
        amount: notification.amount.clone(),
    })
}
