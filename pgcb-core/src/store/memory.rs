//! In-memory [`OrderStore`] used by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{OrderStore, OrderStoreError};
use crate::entities::OrderStatus;

/// One order as the memory store keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub merchant_reference: String,
    pub order_number: Option<String>,
    pub status: OrderStatus,
    pub gateway_reference: Option<String>,
    pub promotion_reference: Option<String>,
    pub failure_message: Option<String>,
}

#[derive(Default)]
struct State {
    orders: HashMap<String, OrderRecord>,
    last_order_number: u64,
    pending_rejection: Option<String>,
}

/// Orders kept in a map, with call counters and a hook to make the next
/// completion fail with an arbitrary text rejection.
///
/// Every operation runs under a single lock, so a test hook and the order
/// it affects are always observed together.
#[derive(Default)]
pub struct MemoryOrderStore {
    state: Mutex<State>,
    add_error_calls: AtomicUsize,
    complete_calls: AtomicUsize,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering generated order references after `last`.
    pub fn with_order_numbers_after(last: u64) -> Self {
        Self {
            state: Mutex::new(State {
                last_order_number: last,
                ..State::default()
            }),
            ..Self::default()
        }
    }

    /// Insert an open order.
    pub async fn open_order(&self, merchant_reference: &str) {
        self.state.lock().await.orders.insert(
            merchant_reference.to_owned(),
            OrderRecord {
                merchant_reference: merchant_reference.to_owned(),
                order_number: None,
                status: OrderStatus::Open,
                gateway_reference: None,
                promotion_reference: None,
                failure_message: None,
            },
        );
    }

    pub async fn order(&self, merchant_reference: &str) -> Option<OrderRecord> {
        self.state.lock().await.orders.get(merchant_reference).cloned()
    }

    /// Make the next `complete` call fail with [`OrderStoreError::Rejected`].
    pub async fn reject_next_completion(&self, message: impl Into<String>) {
        self.state.lock().await.pending_rejection = Some(message.into());
    }

    pub fn add_error_calls(&self) -> usize {
        self.add_error_calls.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn add_error(&self, reference: &str, message: &str) -> Result<(), OrderStoreError> {
        self.add_error_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .get_mut(reference)
            .ok_or_else(|| OrderStoreError::NotFound(reference.to_owned()))?;

        if order.status != OrderStatus::Completed {
            order.status = OrderStatus::Failed;
            order.failure_message = Some(message.to_owned());
        }
        Ok(())
    }

    async fn complete(
        &self,
        merchant_reference: &str,
        gateway_reference: &str,
        promotion_reference: &str,
    ) -> Result<String, OrderStoreError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if let Some(message) = state.pending_rejection.take() {
            return Err(OrderStoreError::Rejected(message));
        }

        let number = state.last_order_number + 1;
        let order = state
            .orders
            .get_mut(merchant_reference)
            .ok_or_else(|| OrderStoreError::NotFound(merchant_reference.to_owned()))?;

        if !order.status.can_complete() {
            return Err(OrderStoreError::InvalidStateChange {
                reference: merchant_reference.to_owned(),
                status: order.status,
            });
        }

        let order_number = format!("ORD-{number}");
        order.status = OrderStatus::Completed;
        order.order_number = Some(order_number.clone());
        order.gateway_reference = Some(gateway_reference.to_owned());
        order.promotion_reference = Some(promotion_reference.to_owned());
        state.last_order_number = number;
        Ok(order_number)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_complete_then_complete_again_is_invalid_state_change() {
        let store = MemoryOrderStore::with_order_numbers_after(122);
        store.open_order("Q-1").await;

        let reference = store.complete("Q-1", "GW-1", "P-1").await.unwrap();
        assert_eq!(reference, "ORD-123");

        let err = store.complete("Q-1", "GW-1", "P-1").await.unwrap_err();
        assert!(err.is_invalid_state_change());
    }

    #[tokio::test]
    async fn test_add_error_never_regresses_completed_order() {
        let store = MemoryOrderStore::new();
        store.open_order("Q-1").await;
        store.complete("Q-1", "GW-1", "").await.unwrap();

        store.add_error("Q-1", "late failure").await.unwrap();
        let order = store.order("Q-1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.failure_message, None);
    }

    #[tokio::test]
    async fn test_failed_order_cannot_be_completed() {
        let store = MemoryOrderStore::new();
        store.open_order("Q-1").await;
        store.add_error("Q-1", "declined").await.unwrap();

        let err = store.complete("Q-1", "GW-1", "").await.unwrap_err();
        assert!(matches!(
            err,
            OrderStoreError::InvalidStateChange {
                status: OrderStatus::Failed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_rejection_hook_is_consumed_by_exactly_one_concurrent_completion() {
        let store = Arc::new(MemoryOrderStore::new());
        store.open_order("Q-1").await;
        store.reject_next_completion("stock unavailable").await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.complete("Q-1", "GW-1", "").await
            }));
        }

        let mut rejected = 0;
        let mut completed = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => completed += 1,
                Err(OrderStoreError::Rejected(_)) => rejected += 1,
                Err(e) if e.is_invalid_state_change() => duplicates += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(rejected, 1);
        assert_eq!(completed, 1);
        assert_eq!(duplicates, 6);
        assert_eq!(store.complete_calls(), 8);
    }

    #[tokio::test]
    async fn test_failed_completion_does_not_consume_order_number() {
        let store = MemoryOrderStore::with_order_numbers_after(9);
        store.open_order("Q-1").await;
        store.open_order("Q-2").await;
        store.add_error("Q-1", "declined").await.unwrap();

        assert!(store.complete("Q-1", "GW-1", "").await.is_err());
        assert_eq!(store.complete("Q-2", "GW-2", "").await.unwrap(), "ORD-10");
    }
}
