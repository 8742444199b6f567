//! Celebrant account and settings entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{CelebrantAccount, CelebrantSettings};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the celebrants table.
#[derive(Debug, Clone, FromRow)]
pub struct CelebrantEntity {
    pub id: Uuid,
    pub auth_subject: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CelebrantEntity> for CelebrantAccount {
    fn from(entity: CelebrantEntity) -> Self {
        Self {
            id: entity.id,
            auth_subject: entity.auth_subject,
            email: entity.email,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the celebrant_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct CelebrantSettingsEntity {
    pub celebrant_id: Uuid,
    pub public_id: String,
    pub name: String,
    pub age: Option<i32>,
    pub profile_image: Option<String>,
    pub background_image: Option<String>,
    pub wishlist_title: Option<String>,
    pub wishlist_description: Option<String>,
    pub enable_wine_selection: bool,
    pub enable_flowers: bool,
    pub enable_money_gift: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<CelebrantSettingsEntity> for CelebrantSettings {
    fn from(entity: CelebrantSettingsEntity) -> Self {
        Self {
            account_id: entity.celebrant_id,
            public_id: entity.public_id,
            name: entity.name,
            age: entity.age,
            profile_image: entity.profile_image,
            background_image: entity.background_image,
            wishlist_title: entity.wishlist_title,
            wishlist_description: entity.wishlist_description,
            enable_wine_selection: entity.enable_wine_selection,
            enable_flowers: entity.enable_flowers,
            enable_money_gift: entity.enable_money_gift,
            updated_at: entity.updated_at,
        }
    }
}
