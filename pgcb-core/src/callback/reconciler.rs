//! Applies a validated callback to the order store.

use pgcb_sdk::objects::TransactionResult;

use super::validator::ValidatedCallback;
use crate::store::{OrderStore, OrderStoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The order was completed.
    Created,
    /// The order was marked failed.
    Failed,
    /// The store refused the completion because the order already left the
    /// open state; treated as a repeated delivery.
    IgnoredDuplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileResult {
    pub order_reference: String,
    pub outcome: ReconcileOutcome,
}

pub struct OrderReconciler<'s> {
    store: &'s dyn OrderStore,
}

impl<'s> OrderReconciler<'s> {
    pub fn new(store: &'s dyn OrderStore) -> Self {
        Self { store }
    }

    pub async fn reconcile(
        &self,
        callback: &ValidatedCallback<'_>,
    ) -> Result<ReconcileResult, OrderStoreError> {
        let notification = callback.notification;
        let merchant_reference = notification.merchant_reference.clone();

        if callback.result == TransactionResult::Failed {
            self.store
                .add_error(
                    &merchant_reference,
                    &format!("Order failed with message {}", notification.message),
                )
                .await?;
            return Ok(ReconcileResult {
                order_reference: merchant_reference,
                outcome: ReconcileOutcome::Failed,
            });
        }

        match self
            .store
            .complete(
                &merchant_reference,
                &notification.gateway_reference,
                &notification.promotion_reference,
            )
            .await
        {
            Ok(order_reference) => Ok(ReconcileResult {
                order_reference,
                outcome: ReconcileOutcome::Created,
            }),
            Err(e) if e.is_invalid_state_change() => {
                tracing::debug!(error = %e, "Ignored: invalid state change requested");
                Ok(ReconcileResult {
                    order_reference: merchant_reference,
                    outcome: ReconcileOutcome::IgnoredDuplicate,
                })
            }
            Err(e) => Err(e),
        }
    }
}
