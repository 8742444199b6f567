//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record how long a named query took.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record connection pool gauges. Called from the readiness probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Count a reservation transaction retried after a lock conflict.
pub fn record_transaction_retry(transaction: &'static str) {
    counter!("database_transaction_retries_total", "transaction" => transaction).increment(1);
}

/// Times a query and records it under the given name.
///
/// ```ignore
/// let timer = QueryTimer::new("lock_reservation_items");
/// let rows = sqlx::query_as::<_, ItemStockEntity>(...).fetch_all(&mut *tx).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("list_wishlist_items");
        assert_eq!(timer.query_name, "list_wishlist_items");
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        QueryTimer::new("noop").record();
        record_transaction_retry("reservation");
    }
}
