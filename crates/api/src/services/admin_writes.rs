//! Celebrant owned writes that may be parked in the pending write queue.
//!
//! Handlers call these directly; the replay job applies queued mutations
//! through the same code via [`MutationSink`].

use domain::models::{
    CelebrantSettings, CreateItemRequest, UpdateItemRequest, UpdateSettingsRequest, WishlistItem,
};
use domain::services::{MutationSink, PendingMutation, PendingWrite, ReplayError, WriteOwner};
use persistence::db::is_transient;
use persistence::repositories::{
    CelebrantRepository, CelebrantSettingsRepository, WishlistItemRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Writes to settings and items for one celebrant at a time.
#[derive(Clone)]
pub struct AdminWriter {
    celebrants: CelebrantRepository,
    settings: CelebrantSettingsRepository,
    items: WishlistItemRepository,
}

impl AdminWriter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            celebrants: CelebrantRepository::new(pool.clone()),
            settings: CelebrantSettingsRepository::new(pool.clone()),
            items: WishlistItemRepository::new(pool),
        }
    }

    /// Loads settings (creating defaults), applies the request and stores the result.
    pub async fn update_settings(
        &self,
        celebrant_id: Uuid,
        request: &UpdateSettingsRequest,
    ) -> Result<CelebrantSettings, sqlx::Error> {
        let mut settings: CelebrantSettings =
            self.settings.get_or_create(celebrant_id).await?.into();
        settings.apply(request);
        Ok(self.settings.update(&settings).await?.into())
    }

    pub async fn create_item(
        &self,
        celebrant_id: Uuid,
        item_id: Uuid,
        request: &CreateItemRequest,
    ) -> Result<WishlistItem, sqlx::Error> {
        Ok(self
            .items
            .create(celebrant_id, item_id, request)
            .await?
            .into())
    }

    /// Returns None when the item does not belong to the celebrant.
    pub async fn update_item(
        &self,
        celebrant_id: Uuid,
        item_id: Uuid,
        request: &UpdateItemRequest,
    ) -> Result<Option<WishlistItem>, sqlx::Error> {
        Ok(self
            .items
            .update_metadata(celebrant_id, item_id, request)
            .await?
            .map(WishlistItem::from))
    }

    /// Returns false when there was nothing to delete.
    pub async fn delete_item(
        &self,
        celebrant_id: Uuid,
        item_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        self.items.delete(celebrant_id, item_id).await
    }

    /// Account a queued write belongs to, created on first use like a
    /// sign-in would.
    pub async fn resolve_owner(&self, owner: &WriteOwner) -> Result<Uuid, sqlx::Error> {
        if let Some(celebrant_id) = owner.celebrant_id {
            return Ok(celebrant_id);
        }
        let account = self
            .celebrants
            .get_or_create_by_subject(&owner.subject, owner.email.as_deref())
            .await?;
        Ok(account.id)
    }
}

fn replay_error(err: sqlx::Error) -> ReplayError {
    if is_transient(&err) {
        ReplayError::Transient(err.to_string())
    } else {
        ReplayError::Permanent(err.to_string())
    }
}

#[async_trait::async_trait]
impl MutationSink for AdminWriter {
    async fn apply(&self, write: &PendingWrite) -> Result<(), ReplayError> {
        let celebrant_id = self
            .resolve_owner(&write.owner)
            .await
            .map_err(replay_error)?;
        match &write.mutation {
            PendingMutation::UpdateSettings { request } => self
                .update_settings(celebrant_id, request)
                .await
                .map(|_| ())
                .map_err(replay_error),
            PendingMutation::CreateItem { item_id, request } => self
                .create_item(celebrant_id, *item_id, request)
                .await
                .map(|_| ())
                .map_err(replay_error),
            PendingMutation::UpdateItem { item_id, request } => {
                match self.update_item(celebrant_id, *item_id, request).await {
                    Ok(Some(_)) => Ok(()),
                    Ok(None) => Err(ReplayError::Permanent(format!(
                        "item {} no longer exists",
                        item_id
                    ))),
                    Err(e) => Err(replay_error(e)),
                }
            }
            // Deleting an item that is already gone leaves the intended state.
            PendingMutation::DeleteItem { item_id } => self
                .delete_item(celebrant_id, *item_id)
                .await
                .map(|_| ())
                .map_err(replay_error),
        }
    }
}
