//! The callback pipeline.
//!
//! A callback flows through four steps, each in its own module:
//!
//! 1. normalisation: [`CallbackRequest::into_parts`] yields the canonical
//!    [`Notification`] and its signature
//! 2. [`validator`]: signature and business checks, fail-fast
//! 3. [`reconciler`]: mark the order failed or complete it; repeated
//!    completions become [`ReconcileOutcome::IgnoredDuplicate`]
//! 4. [`notifier`]: publish a `completed`/`failed` event
//!
//! [`response`] shapes the outcome into the envelope returned to the
//! gateway, or into the single client error it sees on rejection.

pub mod notifier;
pub mod reconciler;
pub mod response;
pub mod validator;

use std::sync::Arc;

use pgcb_sdk::objects::{CallbackRequest, CallbackResult, Notification};

use crate::config::{ConfigStore, GatewayConfig};
use crate::events::EventPublisher;
use crate::store::OrderStore;

pub use notifier::EventNotifier;
pub use reconciler::{OrderReconciler, ReconcileOutcome, ReconcileResult};
pub use response::{CallbackError, build_result};
pub use validator::{CallbackValidator, ValidatedCallback, ValidationError};

/// Entry point for gateway callbacks.
///
/// Cheap to clone; every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct CallbackHandler {
    config: ConfigStore<GatewayConfig>,
    store: Arc<dyn OrderStore>,
    notifier: EventNotifier,
}

impl CallbackHandler {
    pub fn new(
        config: ConfigStore<GatewayConfig>,
        store: Arc<dyn OrderStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            store,
            notifier: EventNotifier::new(publisher),
        }
    }

    /// Authenticate, validate and apply one callback.
    #[tracing::instrument(
        skip_all,
        fields(merchant_reference = %request.notification.merchant_reference)
    )]
    pub async fn handle(&self, request: CallbackRequest) -> Result<CallbackResult, CallbackError> {
        let (notification, signature) = request.into_parts();
        match serde_json::to_string(&notification) {
            Ok(json) => tracing::debug!(request = %json, "Begin callback"),
            Err(e) => tracing::debug!(error = %e, "Begin callback (request not serializable)"),
        }

        self.process(&notification, &signature).await.map_err(|e| {
            tracing::error!(error = %e, "Callback rejected");
            e
        })
    }

    async fn process(
        &self,
        notification: &Notification,
        signature: &str,
    ) -> Result<CallbackResult, CallbackError> {
        let config = self.config.snapshot().await;
        let callback = CallbackValidator::new(&config).validate(notification, signature)?;

        let reconciled = OrderReconciler::new(self.store.as_ref())
            .reconcile(&callback)
            .await?;

        match reconciled.outcome {
            ReconcileOutcome::Created => {
                tracing::info!(
                    order_reference = %reconciled.order_reference,
                    transaction_type = %callback.transaction_type,
                    "Order created"
                );
                self.notifier.notify(notification, true);
            }
            ReconcileOutcome::Failed => {
                tracing::info!(
                    order_reference = %reconciled.order_reference,
                    transaction_type = %callback.transaction_type,
                    "Order failed"
                );
                self.notifier.notify(notification, false);
            }
            ReconcileOutcome::IgnoredDuplicate => {}
        }

        Ok(build_result(notification, &reconciled))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use pgcb_sdk::objects::{CallbackRequest, Notification};
    use pgcb_sdk::signature;

    use crate::config::GatewayConfig;

    pub const SECRET: &[u8] = b"test-gateway-secret";

    pub fn config() -> GatewayConfig {
        GatewayConfig::new("M-1", SECRET.to_vec())
    }

    pub fn notification(result: &str) -> Notification {
        Notification {
            merchant_id: "M-1".to_string(),
            amount: "149.90".to_string(),
            currency: "AUD".to_string(),
            merchant_reference: "Q-100".to_string(),
            gateway_reference: "GW-555".to_string(),
            promotion_reference: "PROMO-1".to_string(),
            result: result.to_string(),
            transaction_type: "SALE".to_string(),
            test: "true".to_string(),
            message: "approved".to_string(),
            timestamp: "2024-05-01T10:00:00+10:00".to_string(),
        }
    }

    pub fn signed(n: &Notification) -> String {
        signature::sign_notification(n, SECRET)
    }

    pub fn request(n: Notification) -> CallbackRequest {
        let signature = signed(&n);
        CallbackRequest {
            notification: n,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{config, notification, request};
    use super::*;
    use crate::entities::OrderStatus;
    use crate::events::{CallbackEventReceiver, ChannelEventPublisher, callback_event_channel};
    use crate::store::memory::MemoryOrderStore;
    use pgcb_sdk::objects::CallbackEventName;

    fn handler(store: Arc<MemoryOrderStore>) -> (CallbackHandler, CallbackEventReceiver) {
        let (tx, rx) = callback_event_channel();
        let handler = CallbackHandler::new(
            ConfigStore::new(config()),
            store,
            Arc::new(ChannelEventPublisher::new(tx)),
        );
        (handler, rx)
    }

    fn drain(rx: &mut CallbackEventReceiver) -> Vec<CallbackEventName> {
        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name);
        }
        names
    }

    #[tokio::test]
    async fn test_invalid_signature_never_touches_store() {
        let store = Arc::new(MemoryOrderStore::new());
        store.open_order("Q-100").await;
        let (handler, mut rx) = handler(store.clone());

        let mut req = request(notification("COMPLETED"));
        req.signature = String::new();
        let err = handler.handle(req).await.unwrap_err();
        assert_eq!(
            err.external_message(),
            "Bad Request - Validation failed with error: Invalid signature"
        );

        let mut req = request(notification("COMPLETED"));
        req.notification.amount = "0.01".to_string();
        assert!(matches!(
            handler.handle(req).await.unwrap_err(),
            CallbackError::Validation(ValidationError::InvalidSignature)
        ));

        assert_eq!(store.add_error_calls(), 0);
        assert_eq!(store.complete_calls(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_validation_failures_map_to_reasons() {
        let store = Arc::new(MemoryOrderStore::new());
        let (handler, _rx) = handler(store.clone());

        let mut n = notification("COMPLETED");
        n.merchant_id = "M-2".to_string();
        assert_eq!(
            handler.handle(request(n)).await.unwrap_err().external_message(),
            "Bad Request - Validation failed with error: Invalid merchant"
        );

        let mut n = notification("COMPLETED");
        n.currency = "USD".to_string();
        assert_eq!(
            handler.handle(request(n)).await.unwrap_err().external_message(),
            "Bad Request - Validation failed with error: Unsupported currency"
        );

        let n = notification("CANCELLED");
        assert_eq!(
            handler.handle(request(n)).await.unwrap_err().external_message(),
            "Bad Request - Validation failed with error: Unsupported result"
        );

        let mut n = notification("COMPLETED");
        n.transaction_type = "AUTH".to_string();
        assert_eq!(
            handler.handle(request(n)).await.unwrap_err().external_message(),
            "Bad Request - Validation failed with error: Unsupported transaction type"
        );

        assert_eq!(store.complete_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_result_marks_order_and_dispatches_once() {
        let store = Arc::new(MemoryOrderStore::new());
        store.open_order("Q-100").await;
        let (handler, mut rx) = handler(store.clone());

        let result = handler.handle(request(notification("FAILED"))).await.unwrap();
        let entry = result.entry();
        assert_eq!(entry.message, "Failed order Q-100");
        assert_eq!(entry.order_reference, "Q-100");

        assert_eq!(store.add_error_calls(), 1);
        assert_eq!(
            store.order("Q-100").await.unwrap().status,
            OrderStatus::Failed
        );
        assert_eq!(drain(&mut rx), vec![CallbackEventName::Failed]);
    }

    #[tokio::test]
    async fn test_completed_result_creates_order_and_dispatches_once() {
        let store = Arc::new(MemoryOrderStore::with_order_numbers_after(122));
        store.open_order("Q-100").await;
        let (handler, mut rx) = handler(store.clone());

        let n = notification("COMPLETED");
        let result = handler.handle(request(n.clone())).await.unwrap();
        let entry = result.entry();
        assert_eq!(entry.message, "Created order ORD-123");
        assert_eq!(entry.order_reference, "ORD-123");
        assert_eq!(entry.amount, n.amount);
        assert_eq!(entry.merchant_id, n.merchant_id);
        assert_eq!(entry.gateway_reference, n.gateway_reference);
        assert_eq!(entry.promotion_reference, n.promotion_reference);

        assert_eq!(drain(&mut rx), vec![CallbackEventName::Completed]);
    }

    #[tokio::test]
    async fn test_duplicate_completion_is_success_shaped() {
        let store = Arc::new(MemoryOrderStore::new());
        store.open_order("Q-100").await;
        let (handler, mut rx) = handler(store.clone());

        let req = request(notification("COMPLETED"));
        let first = handler.handle(req.clone()).await.unwrap();
        assert!(first.entry().message.starts_with("Created order ORD-"));

        let second = handler.handle(req).await.unwrap();
        assert_eq!(
            second.entry().message,
            "Created order (ignored state change) Q-100"
        );
        assert_eq!(second.entry().order_reference, "Q-100");

        // only the first delivery publishes
        assert_eq!(drain(&mut rx), vec![CallbackEventName::Completed]);
    }

    #[tokio::test]
    async fn test_store_failure_is_bad_request() {
        let store = Arc::new(MemoryOrderStore::new());
        store.open_order("Q-100").await;
        store.reject_next_completion("Quote is inactive").await;
        let (handler, mut rx) = handler(store.clone());

        let err = handler
            .handle(request(notification("COMPLETED")))
            .await
            .unwrap_err();
        assert_eq!(CallbackError::STATUS_CODE, 400);
        assert_eq!(err.external_message(), "Bad Request - Quote is inactive");
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_closed_event_bus_does_not_fail_callback() {
        let store = Arc::new(MemoryOrderStore::new());
        store.open_order("Q-100").await;
        let (handler, rx) = handler(store.clone());
        drop(rx);

        let result = handler.handle(request(notification("FAILED"))).await.unwrap();
        assert_eq!(result.entry().message, "Failed order Q-100");
    }

    #[tokio::test]
    async fn test_config_reload_applies_to_next_callback() {
        let store = Arc::new(MemoryOrderStore::new());
        store.open_order("Q-100").await;
        let config_store = ConfigStore::new(config());
        let (tx, _rx) = callback_event_channel();
        let handler = CallbackHandler::new(
            config_store.clone(),
            store,
            Arc::new(ChannelEventPublisher::new(tx)),
        );

        config_store
            .update(GatewayConfig::new("M-1", b"rotated".to_vec()))
            .await;

        assert!(matches!(
            handler.handle(request(notification("FAILED"))).await,
            Err(CallbackError::Validation(ValidationError::InvalidSignature))
        ));
    }
}
