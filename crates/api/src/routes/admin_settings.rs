//! Celebrant settings endpoints.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::celebrant::ShareIdResponse;
use domain::models::{CelebrantSettings, UpdateSettingsRequest};
use domain::services::PendingMutation;
use persistence::repositories::CelebrantSettingsRepository;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CelebrantAuth;
use crate::routes::queued::{queue_on_transient, queue_unresolved, WriteOutcome};
use crate::services::AdminWriter;

/// Get the celebrant's settings, creating defaults on first access.
///
/// GET /api/v1/admin/settings
pub async fn get_settings(
    State(state): State<AppState>,
    auth: CelebrantAuth,
) -> Result<Json<CelebrantSettings>, ApiError> {
    let settings = CelebrantSettingsRepository::new(state.pool.clone())
        .get_or_create(auth.account_id()?)
        .await?;
    Ok(Json(settings.into()))
}

/// Update the celebrant's settings.
///
/// PUT /api/v1/admin/settings
pub async fn update_settings(
    State(state): State<AppState>,
    auth: CelebrantAuth,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<WriteOutcome<CelebrantSettings>, ApiError> {
    request.validate()?;

    let Some(celebrant_id) = auth.celebrant_id else {
        return queue_unresolved(&state, &auth, PendingMutation::UpdateSettings { request }).await;
    };

    match AdminWriter::new(state.pool.clone())
        .update_settings(celebrant_id, &request)
        .await
    {
        Ok(settings) => {
            info!(celebrant_id = %celebrant_id, "Settings updated");
            Ok(WriteOutcome::Applied(StatusCode::OK, settings))
        }
        Err(e) => {
            queue_on_transient(&state, &auth, PendingMutation::UpdateSettings { request }, e).await
        }
    }
}

/// Replace the public share id. Old links stop resolving.
///
/// POST /api/v1/admin/settings/share-id
pub async fn regenerate_share_id(
    State(state): State<AppState>,
    auth: CelebrantAuth,
) -> Result<Json<ShareIdResponse>, ApiError> {
    let celebrant_id = auth.account_id()?;
    let repo = CelebrantSettingsRepository::new(state.pool.clone());
    // Settings must exist before the id can be replaced.
    repo.get_or_create(celebrant_id).await?;

    let settings = repo
        .regenerate_public_id(celebrant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Settings not found".to_string()))?;

    info!(celebrant_id = %celebrant_id, "Share id regenerated");

    Ok(Json(ShareIdResponse {
        celebrant_id: settings.public_id,
    }))
}
