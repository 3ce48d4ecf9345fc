use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "order_status")]
pub enum OrderStatus {
    Open,
    Completed,
    Failed,
}

impl OrderStatus {
    /// Only open orders may be completed. Completed and failed are terminal.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Open)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Open => write!(f, "open"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompleteOrderOutcome {
    Completed { order_number: String },
    NotFound,
    InvalidState(OrderStatus),
}

/// Move an open order to `completed`, assigning its order number.
///
/// The row is locked for the duration of the transaction so two deliveries
/// of the same callback cannot both complete it.
#[derive(Debug, Clone)]
pub struct CompleteOrder {
    pub merchant_reference: String,
    pub gateway_reference: String,
    pub promotion_reference: String,
}

impl Processor<CompleteOrder> for DatabaseProcessor {
    type Output = CompleteOrderOutcome;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CompleteOrder")]
    async fn process(&self, update: CompleteOrder) -> Result<CompleteOrderOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM orders WHERE merchant_reference = $1 FOR UPDATE",
        )
        .bind(&update.merchant_reference)
        .fetch_optional(&mut *tx)
        .await?;

        let status = match status {
            None => return Ok(CompleteOrderOutcome::NotFound),
            Some(status) if !status.can_complete() => {
                return Ok(CompleteOrderOutcome::InvalidState(status));
            }
            Some(status) => status,
        };
        tracing::debug!(from = %status, "Completing order");

        let order_number = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE orders
            SET status = 'completed',
                order_number = 'ORD-' || lpad(nextval('order_number_seq')::text, 9, '0'),
                gateway_reference = $2,
                promotion_reference = $3,
                updated_at = now()
            WHERE merchant_reference = $1
            RETURNING order_number
            "#,
        )
        .bind(&update.merchant_reference)
        .bind(&update.gateway_reference)
        .bind(&update.promotion_reference)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(CompleteOrderOutcome::Completed { order_number })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOrderFailedOutcome {
    Marked,
    /// The order had already completed and was left untouched.
    AlreadyCompleted,
    NotFound,
}

/// Record a gateway failure on an order.
///
/// Open and failed orders end up `failed` with the latest reason. A
/// completed order is never moved back.
#[derive(Debug, Clone)]
pub struct MarkOrderFailed {
    pub merchant_reference: String,
    pub reason: String,
}

impl Processor<MarkOrderFailed> for DatabaseProcessor {
    type Output = MarkOrderFailedOutcome;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkOrderFailed")]
    async fn process(&self, update: MarkOrderFailed) -> Result<MarkOrderFailedOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM orders WHERE merchant_reference = $1 FOR UPDATE",
        )
        .bind(&update.merchant_reference)
        .fetch_optional(&mut *tx)
        .await?;

        match status {
            None => return Ok(MarkOrderFailedOutcome::NotFound),
            Some(OrderStatus::Completed) => return Ok(MarkOrderFailedOutcome::AlreadyCompleted),
            Some(_) => {}
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET status = 'failed', failure_message = $2, updated_at = now()
            WHERE merchant_reference = $1
            "#,
        )
        .bind(&update.merchant_reference)
        .bind(&update.reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(MarkOrderFailedOutcome::Marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The queries above are checked at runtime, so pin the names they use
    // against the schema.
    const MIGRATION: &str = include_str!("../../../migrations/20240101000000_orders.sql");

    #[test]
    fn test_status_labels_match_schema_enum() {
        let enum_line = MIGRATION
            .lines()
            .find(|line| line.starts_with("CREATE TYPE order_status"))
            .unwrap();
        for status in [OrderStatus::Open, OrderStatus::Completed, OrderStatus::Failed] {
            assert!(
                enum_line.contains(&format!("'{status}'")),
                "missing {status} in {enum_line}"
            );
        }
    }

    #[test]
    fn test_queried_columns_exist_in_schema() {
        for name in [
            "merchant_reference",
            "order_number",
            "status",
            "gateway_reference",
            "promotion_reference",
            "failure_message",
            "updated_at",
            "SEQUENCE order_number_seq",
        ] {
            assert!(MIGRATION.contains(name), "schema lacks {name}");
        }
    }

    #[test]
    fn test_only_open_orders_complete() {
        assert!(OrderStatus::Open.can_complete());
        assert!(!OrderStatus::Completed.can_complete());
        assert!(!OrderStatus::Failed.can_complete());
    }
}
