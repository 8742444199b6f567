//! Guest gift reservation endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::reservation::ReservationResponse;
use domain::models::CreateReservationRequest;
use domain::services::{ReservationDraft, ReservationError};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_reservation_created, record_reservation_rejected};
use crate::routes::public_wishlist::{resolve_account, resolve_share_id};

fn rejection_reason(err: &ReservationError) -> &'static str {
    match err {
        ReservationError::Validation(_) => "validation",
        ReservationError::ItemNotFound(_) => "item_not_found",
        ReservationError::OutOfStock { .. } => "out_of_stock",
        ReservationError::TransientBackendFailure(_) => "backend_unavailable",
    }
}

async fn submit(
    state: &AppState,
    celebrant_id: Uuid,
    request: CreateReservationRequest,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let draft = ReservationDraft::from_request(celebrant_id, request);

    match state.reservations.submit(draft).await {
        Ok(reservation) => {
            record_reservation_created(reservation.selected_items.len());
            Ok((
                StatusCode::CREATED,
                Json(ReservationResponse::confirmed(reservation.id)),
            ))
        }
        Err(e) => {
            record_reservation_rejected(rejection_reason(&e));
            Err(e.into())
        }
    }
}

/// Reserve gifts on a celebrant's wishlist.
///
/// POST /api/v1/reservations
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    request.validate()?;
    let celebrant_id = resolve_account(&state, request.celebrant_id).await?;
    submit(&state, celebrant_id, request).await
}

/// Reserve gifts on the wishlist behind a share id.
///
/// POST /api/v1/wishlists/:share_id/reservations
pub async fn create_reservation_for_share(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    request.validate()?;
    let settings = resolve_share_id(&state, &share_id).await?;
    submit(&state, settings.account_id, request).await
}
