//! Wishlist item management for the celebrant.
//!
//! Stock counters are owned by the reservation transaction, so updates here
//! only touch display metadata.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::wishlist_item::ListItemsResponse;
use domain::models::{CreateItemRequest, UpdateItemRequest, WishlistItem};
use domain::services::PendingMutation;
use persistence::repositories::WishlistItemRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CelebrantAuth;
use crate::routes::queued::{queue_on_transient, queue_unresolved, WriteOutcome};
use crate::services::AdminWriter;

fn item_not_found(item_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Wishlist item {} not found", item_id))
}

/// List the celebrant's items in creation order.
///
/// GET /api/v1/admin/items
pub async fn list_items(
    State(state): State<AppState>,
    auth: CelebrantAuth,
) -> Result<Json<ListItemsResponse>, ApiError> {
    let items: Vec<WishlistItem> = WishlistItemRepository::new(state.pool.clone())
        .list_by_celebrant(auth.account_id()?)
        .await?
        .into_iter()
        .map(WishlistItem::from)
        .collect();

    Ok(Json(ListItemsResponse {
        count: items.len(),
        items,
    }))
}

/// Add an item to the wishlist.
///
/// POST /api/v1/admin/items
pub async fn create_item(
    State(state): State<AppState>,
    auth: CelebrantAuth,
    Json(request): Json<CreateItemRequest>,
) -> Result<WriteOutcome<WishlistItem>, ApiError> {
    request.validate()?;

    // The id is chosen here so a queued create keeps it on replay.
    let item_id = Uuid::new_v4();
    let mutation = |request: CreateItemRequest| PendingMutation::CreateItem { item_id, request };
    let Some(celebrant_id) = auth.celebrant_id else {
        return queue_unresolved(&state, &auth, mutation(request)).await;
    };

    match AdminWriter::new(state.pool.clone())
        .create_item(celebrant_id, item_id, &request)
        .await
    {
        Ok(item) => {
            info!(
                celebrant_id = %celebrant_id,
                item_id = %item.id,
                quantity = item.quantity,
                "Wishlist item created"
            );
            Ok(WriteOutcome::Applied(StatusCode::CREATED, item))
        }
        Err(e) => queue_on_transient(&state, &auth, mutation(request), e).await,
    }
}

/// Edit an item's title, description, image or category.
///
/// PATCH /api/v1/admin/items/:item_id
pub async fn update_item(
    State(state): State<AppState>,
    auth: CelebrantAuth,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<WriteOutcome<WishlistItem>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::Validation(
            "At least one field must be provided".to_string(),
        ));
    }
    request.validate()?;

    let mutation = |request: UpdateItemRequest| PendingMutation::UpdateItem { item_id, request };
    let Some(celebrant_id) = auth.celebrant_id else {
        return queue_unresolved(&state, &auth, mutation(request)).await;
    };

    match AdminWriter::new(state.pool.clone())
        .update_item(celebrant_id, item_id, &request)
        .await
    {
        Ok(Some(item)) => {
            info!(
                celebrant_id = %celebrant_id,
                item_id = %item_id,
                "Wishlist item updated"
            );
            Ok(WriteOutcome::Applied(StatusCode::OK, item))
        }
        Ok(None) => Err(item_not_found(item_id)),
        Err(e) => queue_on_transient(&state, &auth, mutation(request), e).await,
    }
}

/// Remove an item from the wishlist.
///
/// DELETE /api/v1/admin/items/:item_id
pub async fn delete_item(
    State(state): State<AppState>,
    auth: CelebrantAuth,
    Path(item_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mutation = PendingMutation::DeleteItem { item_id };
    let Some(celebrant_id) = auth.celebrant_id else {
        return Ok(queue_unresolved::<()>(&state, &auth, mutation)
            .await?
            .into_response());
    };

    match AdminWriter::new(state.pool.clone())
        .delete_item(celebrant_id, item_id)
        .await
    {
        Ok(true) => {
            info!(
                celebrant_id = %celebrant_id,
                item_id = %item_id,
                "Wishlist item deleted"
            );
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Ok(false) => Err(item_not_found(item_id)),
        Err(e) => Ok(queue_on_transient::<()>(&state, &auth, mutation, e)
            .await?
            .into_response()),
    }
}
