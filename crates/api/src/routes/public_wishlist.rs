//! Public wishlist resolution by share id.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{CelebrantSettings, PublicWishlist, WishlistItem};
use persistence::repositories::{
    CelebrantRepository, CelebrantSettingsRepository, WishlistItemRepository,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

fn wishlist_not_found() -> ApiError {
    ApiError::NotFound("Wishlist not found".to_string())
}

/// Resolves a public share id to the owner's settings through the unique
/// `public_id` index.
pub(crate) async fn resolve_share_id(
    state: &AppState,
    share_id: &str,
) -> Result<CelebrantSettings, ApiError> {
    if !shared::crypto::is_valid_share_id(share_id) {
        return Err(wishlist_not_found());
    }

    CelebrantSettingsRepository::new(state.pool.clone())
        .find_by_public_id(share_id)
        .await?
        .map(CelebrantSettings::from)
        .ok_or_else(wishlist_not_found)
}

/// Checks that a celebrant account referenced by a request body exists.
pub(crate) async fn resolve_account(
    state: &AppState,
    celebrant_id: Option<Uuid>,
) -> Result<Uuid, ApiError> {
    let celebrant_id =
        celebrant_id.ok_or_else(|| ApiError::Validation("celebrant_id is required".to_string()))?;

    CelebrantRepository::new(state.pool.clone())
        .find_by_id(celebrant_id)
        .await?
        .map(|account| account.id)
        .ok_or_else(wishlist_not_found)
}

/// Get a wishlist by its public share id.
///
/// GET /api/v1/wishlists/:share_id
pub async fn get_public_wishlist(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<PublicWishlist>, ApiError> {
    let settings = resolve_share_id(&state, &share_id).await?;

    let wishlist_items: Vec<WishlistItem> = WishlistItemRepository::new(state.pool.clone())
        .list_by_celebrant(settings.account_id)
        .await?
        .into_iter()
        .map(WishlistItem::from)
        .collect();

    tracing::debug!(
        share_id = %share_id,
        items = wishlist_items.len(),
        "Resolved public wishlist"
    );

    Ok(Json(PublicWishlist {
        celebrant_settings: settings,
        wishlist_items,
    }))
}
