//! Guest money gift endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::donation::DonationResponse;
use domain::models::{CelebrantSettings, CreateDonationRequest, MoneyDonation, NewDonation};
use domain::services::dispatch_donation;
use persistence::repositories::{CelebrantSettingsRepository, DonationRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_donation_recorded;
use crate::routes::public_wishlist::{resolve_account, resolve_share_id};

fn ensure_money_gifts_enabled(enabled: bool) -> Result<(), ApiError> {
    if enabled {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Money gifts are not enabled for this wishlist".to_string(),
        ))
    }
}

async fn record(
    state: &AppState,
    celebrant_id: Uuid,
    request: CreateDonationRequest,
) -> Result<(StatusCode, Json<DonationResponse>), ApiError> {
    let new_donation = NewDonation::from_request(celebrant_id, request);
    let donation: MoneyDonation = DonationRepository::new(state.pool.clone())
        .create(&new_donation)
        .await?
        .into();

    info!(
        donation_id = %donation.id,
        celebrant_id = %celebrant_id,
        transfer_type = %donation.transfer_type,
        currency = %donation.currency,
        "Money gift recorded"
    );
    record_donation_recorded(donation.transfer_type.as_str());

    let donation_id = donation.id;
    dispatch_donation(state.notifier.clone(), donation);

    Ok((
        StatusCode::CREATED,
        Json(DonationResponse::recorded(donation_id)),
    ))
}

/// Pledge a money gift to a celebrant.
///
/// POST /api/v1/donations
pub async fn create_donation(
    State(state): State<AppState>,
    Json(request): Json<CreateDonationRequest>,
) -> Result<(StatusCode, Json<DonationResponse>), ApiError> {
    request.validate()?;
    let celebrant_id = resolve_account(&state, request.celebrant_id).await?;

    // Accounts that never opened their settings run on defaults.
    let enabled = CelebrantSettingsRepository::new(state.pool.clone())
        .find_by_celebrant(celebrant_id)
        .await?
        .map(|s| s.enable_money_gift)
        .unwrap_or(CelebrantSettings::DEFAULT_ENABLE_MONEY_GIFT);
    ensure_money_gifts_enabled(enabled)?;

    record(&state, celebrant_id, request).await
}

/// Pledge a money gift on the wishlist behind a share id.
///
/// POST /api/v1/wishlists/:share_id/donations
pub async fn create_donation_for_share(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    Json(request): Json<CreateDonationRequest>,
) -> Result<(StatusCode, Json<DonationResponse>), ApiError> {
    request.validate()?;
    let settings = resolve_share_id(&state, &share_id).await?;
    ensure_money_gifts_enabled(settings.enable_money_gift)?;

    record(&state, settings.account_id, request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_gift_toggle() {
        assert!(ensure_money_gifts_enabled(true).is_ok());
        assert!(matches!(
            ensure_money_gifts_enabled(false),
            Err(ApiError::Forbidden(_))
        ));
    }
}
