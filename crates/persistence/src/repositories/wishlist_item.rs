//! Repository for wishlist item operations.
//!
//! Stock counters are only written by the reservation transaction; the
//! methods here create items and edit display metadata.

use domain::models::{CreateItemRequest, UpdateItemRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::WishlistItemEntity;
use crate::metrics::QueryTimer;

const ITEM_COLUMNS: &str = "id, celebrant_id, title, description, image, category, \
     quantity, reserved, created_at, updated_at";

/// Repository for wishlist item database operations.
#[derive(Clone)]
pub struct WishlistItemRepository {
    pool: PgPool,
}

impl WishlistItemRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists a celebrant's items in creation order.
    pub async fn list_by_celebrant(
        &self,
        celebrant_id: Uuid,
    ) -> Result<Vec<WishlistItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_wishlist_items");
        let result = sqlx::query_as::<_, WishlistItemEntity>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM wishlist_items
            WHERE celebrant_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(celebrant_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds one of a celebrant's items.
    pub async fn find(
        &self,
        celebrant_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<WishlistItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_wishlist_item");
        let result = sqlx::query_as::<_, WishlistItemEntity>(&format!(
            "SELECT {ITEM_COLUMNS} FROM wishlist_items WHERE id = $1 AND celebrant_id = $2"
        ))
        .bind(item_id)
        .bind(celebrant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Creates an item with a caller chosen id.
    ///
    /// Creating the same id twice for the same celebrant returns the existing
    /// row, so a replayed create does not duplicate the item.
    pub async fn create(
        &self,
        celebrant_id: Uuid,
        item_id: Uuid,
        request: &CreateItemRequest,
    ) -> Result<WishlistItemEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_wishlist_item");
        let inserted = sqlx::query_as::<_, WishlistItemEntity>(&format!(
            r#"
            INSERT INTO wishlist_items (id, celebrant_id, title, description, image, category, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(celebrant_id)
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(&request.image)
        .bind(&request.category)
        .bind(request.quantity)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match inserted? {
            Some(item) => Ok(item),
            None => self
                .find(celebrant_id, item_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Updates display metadata. Absent fields keep their value.
    /// Returns None if the item does not exist for this celebrant.
    pub async fn update_metadata(
        &self,
        celebrant_id: Uuid,
        item_id: Uuid,
        request: &UpdateItemRequest,
    ) -> Result<Option<WishlistItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_wishlist_item");
        let result = sqlx::query_as::<_, WishlistItemEntity>(&format!(
            r#"
            UPDATE wishlist_items SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                image = COALESCE($5, image),
                category = COALESCE($6, category),
                updated_at = NOW()
            WHERE id = $1 AND celebrant_id = $2
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(celebrant_id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(&request.description)
        .bind(&request.image)
        .bind(&request.category)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes an item. Returns true if a row was removed.
    pub async fn delete(&self, celebrant_id: Uuid, item_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_wishlist_item");
        let result = sqlx::query(
            r#"
            DELETE FROM wishlist_items
            WHERE id = $1 AND celebrant_id = $2
            "#,
        )
        .bind(item_id)
        .bind(celebrant_id)
        .execute(&self.pool)
        .await;
        timer.record();

        Ok(result?.rows_affected() > 0)
    }
}
