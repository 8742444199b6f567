//! Response for admin writes that were parked in the pending write queue.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::PendingMutation;
use persistence::db::is_transient;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CelebrantAuth;
use crate::middleware::metrics::record_write_queued;

/// Body of a `202 Accepted` answer.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedWriteResponse {
    pub queued: bool,
    pub write_id: Uuid,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
}

/// Either the stored result or a queued acknowledgement.
#[derive(Debug)]
pub enum WriteOutcome<T> {
    Applied(StatusCode, T),
    Queued(QueuedWriteResponse),
}

impl<T: Serialize> IntoResponse for WriteOutcome<T> {
    fn into_response(self) -> Response {
        match self {
            WriteOutcome::Applied(status, body) => (status, Json(body)).into_response(),
            WriteOutcome::Queued(body) => (StatusCode::ACCEPTED, Json(body)).into_response(),
        }
    }
}

/// Queues `mutation` when `err` is transient, otherwise converts the error.
pub async fn queue_on_transient<T>(
    state: &AppState,
    auth: &CelebrantAuth,
    mutation: PendingMutation,
    err: sqlx::Error,
) -> Result<WriteOutcome<T>, ApiError> {
    if !is_transient(&err) {
        return Err(err.into());
    }
    queue_write(state, auth, mutation, &err.to_string()).await
}

/// Queues a write whose owner's account could not be looked up.
pub async fn queue_unresolved<T>(
    state: &AppState,
    auth: &CelebrantAuth,
    mutation: PendingMutation,
) -> Result<WriteOutcome<T>, ApiError> {
    queue_write(state, auth, mutation, "account lookup unavailable").await
}

/// Parks `mutation` in the pending write queue and answers 202.
async fn queue_write<T>(
    state: &AppState,
    auth: &CelebrantAuth,
    mutation: PendingMutation,
    reason: &str,
) -> Result<WriteOutcome<T>, ApiError> {
    let op = mutation.kind();
    let item_id = match &mutation {
        PendingMutation::CreateItem { item_id, .. }
        | PendingMutation::UpdateItem { item_id, .. }
        | PendingMutation::DeleteItem { item_id } => Some(*item_id),
        PendingMutation::UpdateSettings { .. } => None,
    };

    let write = state
        .pending_writes
        .enqueue(auth.owner(), mutation)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to queue write: {}", e)))?;

    warn!(
        write_id = %write.id,
        subject = %auth.subject,
        op,
        error = reason,
        "Database unavailable, admin write queued"
    );
    record_write_queued(op);

    Ok(WriteOutcome::Queued(QueuedWriteResponse {
        queued: true,
        write_id: write.id,
        op,
        item_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_queued_response_shape() {
        let write_id = Uuid::new_v4();
        let outcome: WriteOutcome<()> = WriteOutcome::Queued(QueuedWriteResponse {
            queued: true,
            write_id,
            op: "update_settings",
            item_id: None,
        });
        let response = outcome.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["queued"], true);
        assert_eq!(json["op"], "update_settings");
        assert!(json.get("item_id").is_none());
    }

    #[tokio::test]
    async fn test_applied_response_keeps_status() {
        let outcome = WriteOutcome::Applied(StatusCode::CREATED, serde_json::json!({"ok": 1}));
        assert_eq!(outcome.into_response().status(), StatusCode::CREATED);
    }
}
