//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub pending_writes: PendingWritesHealth,
    pub integrations: IntegrationsHealth,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Admin writes waiting for the database.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PendingWritesHealth {
    pub queued: usize,
}

/// Whether the outbound integrations have credentials.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct IntegrationsHealth {
    pub email_enabled: bool,
    pub letters_configured: bool,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Overall status. Queued writes mean the service is up but behind.
fn overall_status(db_connected: bool, queued: usize) -> &'static str {
    match (db_connected, queued) {
        (false, _) => "unhealthy",
        (true, 0) => "healthy",
        (true, _) => "degraded",
    }
}

/// Full health check endpoint.
///
/// GET /api/health
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let db_connected = persistence::db::ping(&state.pool).await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;
    let queued = state.pending_writes.len().await;

    let response = HealthResponse {
        status: overall_status(db_connected, queued).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            connected: db_connected,
            latency_ms: db_connected.then_some(latency_ms),
        },
        pending_writes: PendingWritesHealth { queued },
        integrations: IntegrationsHealth {
            email_enabled: state.config.email.enabled,
            letters_configured: state.letters.is_configured(),
        },
    };

    let status = if db_connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness probe endpoint.
///
/// GET /api/health/live
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint. Ready means the database answers.
///
/// GET /api/health/ready
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    persistence::metrics::record_pool_metrics(&state.pool);

    match persistence::db::ping(&state.pool).await {
        Ok(()) => Ok(Json(StatusResponse {
            status: "ready".to_string(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
