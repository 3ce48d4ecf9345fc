//! The order store contract the callback pipeline reconciles against.
//!
//! The pipeline only needs two operations: recording a failure on an order
//! and completing it. [`DatabaseProcessor`] implements them on top of the
//! `orders` table; tests use the in-memory store from [`memory`].

use async_trait::async_trait;
use kanau::processor::Processor;

use crate::entities::OrderStatus;
use crate::entities::order_records::{
    CompleteOrder, CompleteOrderOutcome, MarkOrderFailed, MarkOrderFailedOutcome,
};
use crate::framework::DatabaseProcessor;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

/// Lowercased marker that opaque store rejections use for a refused
/// state transition.
const INVALID_STATE_CHANGE_MARKER: &str = "invalid state change requested";

#[derive(Debug, thiserror::Error)]
pub enum OrderStoreError {
    /// The order exists but its current state does not allow the transition.
    #[error("Invalid state change requested: order {reference} is {status}")]
    InvalidStateChange {
        reference: String,
        status: OrderStatus,
    },

    #[error("Order {0} not found")]
    NotFound(String),

    /// A rejection reported by a store only as text.
    #[error("{0}")]
    Rejected(String),

    #[error("order store unavailable")]
    Database(#[from] sqlx::Error),
}

impl OrderStoreError {
    /// Whether this error means the order was already moved past the
    /// requested state, i.e. the callback is a duplicate delivery.
    pub fn is_invalid_state_change(&self) -> bool {
        match self {
            OrderStoreError::InvalidStateChange { .. } => true,
            OrderStoreError::Rejected(message) => message
                .to_lowercase()
                .contains(INVALID_STATE_CHANGE_MARKER),
            OrderStoreError::NotFound(_) | OrderStoreError::Database(_) => false,
        }
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Record `message` as the failure reason of the order. Never moves a
    /// completed order back.
    async fn add_error(&self, reference: &str, message: &str) -> Result<(), OrderStoreError>;

    /// Complete the order and return its authoritative order reference.
    async fn complete(
        &self,
        merchant_reference: &str,
        gateway_reference: &str,
        promotion_reference: &str,
    ) -> Result<String, OrderStoreError>;
}

#[async_trait]
impl OrderStore for DatabaseProcessor {
    async fn add_error(&self, reference: &str, message: &str) -> Result<(), OrderStoreError> {
        let outcome = self
            .process(MarkOrderFailed {
                merchant_reference: reference.to_owned(),
                reason: message.to_owned(),
            })
            .await?;

        match outcome {
            MarkOrderFailedOutcome::Marked => Ok(()),
            MarkOrderFailedOutcome::AlreadyCompleted => {
                tracing::warn!(reference, "Failure reported for a completed order, keeping it completed");
                Ok(())
            }
            MarkOrderFailedOutcome::NotFound => Err(OrderStoreError::NotFound(reference.to_owned())),
        }
    }

    async fn complete(
        &self,
        merchant_reference: &str,
        gateway_reference: &str,
        promotion_reference: &str,
    ) -> Result<String, OrderStoreError> {
        let outcome = self
            .process(CompleteOrder {
                merchant_reference: merchant_reference.to_owned(),
                gateway_reference: gateway_reference.to_owned(),
                promotion_reference: promotion_reference.to_owned(),
            })
            .await?;

        match outcome {
            CompleteOrderOutcome::Completed { order_number } => Ok(order_number),
            CompleteOrderOutcome::InvalidState(status) => Err(OrderStoreError::InvalidStateChange {
                reference: merchant_reference.to_owned(),
                status,
            }),
            CompleteOrderOutcome::NotFound => {
                Err(OrderStoreError::NotFound(merchant_reference.to_owned()))
            }
        }
    }
}
