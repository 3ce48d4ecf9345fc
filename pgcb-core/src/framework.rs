use sqlx::PgPool;

/// Runs database queries against the shared pool.
///
/// Each query is a type implementing `kanau::processor::Processor` for this
/// struct; see [`crate::entities::order_records`].
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
