//! Wishlist item entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::WishlistItem;
use domain::services::ItemStock;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the wishlist_items table.
#[derive(Debug, Clone, FromRow)]
pub struct WishlistItemEntity {
    pub id: Uuid,
    pub celebrant_id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub reserved: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WishlistItemEntity> for WishlistItem {
    fn from(entity: WishlistItemEntity) -> Self {
        Self {
            id: entity.id,
            celebrant_id: entity.celebrant_id,
            title: entity.title,
            description: entity.description,
            image: entity.image,
            category: entity.category,
            quantity: entity.quantity,
            reserved: entity.reserved,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Stock counters read under a row lock.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ItemStockEntity {
    pub id: Uuid,
    pub quantity: i32,
    pub reserved: i32,
}

impl From<ItemStockEntity> for ItemStock {
    fn from(entity: ItemStockEntity) -> Self {
        Self {
            id: entity.id,
            quantity: entity.quantity,
            reserved: entity.reserved,
        }
    }
}
