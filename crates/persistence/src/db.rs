//! Database connection pool management and error classification.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Creates a PostgreSQL connection pool with the given configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
}

/// Checks that the database answers a trivial query.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// SQLSTATE for serialization failures.
pub const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for detected deadlocks.
pub const DEADLOCK_DETECTED: &str = "40P01";

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// True for lock conflicts that are resolved by retrying the whole transaction.
pub fn is_retryable_conflict(err: &sqlx::Error) -> bool {
    matches!(
        sqlstate(err).as_deref(),
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
    )
}

/// True if the error means the backend is (temporarily) unreachable or
/// overloaded rather than the request being wrong.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Tls(_) => true,
        sqlx::Error::Database(_) => {
            let code = sqlstate(err).unwrap_or_default();
            is_retryable_conflict(err)
                // connection exceptions
                || code.starts_with("08")
                // insufficient resources
                || code.starts_with("53")
                // admin shutdown, crash shutdown, cannot connect now
                || matches!(code.as_str(), "57P01" | "57P02" | "57P03")
        }
        _ => false,
    }
}
