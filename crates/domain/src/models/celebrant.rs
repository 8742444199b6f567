//! Celebrant account and settings domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::wishlist_item::WishlistItem;

/// Internal account of a celebrant, keyed by the identity provider subject.
#[derive(Debug, Clone, PartialEq)]
pub struct CelebrantAccount {
    pub id: Uuid,
    pub auth_subject: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile and feature settings of a celebrant.
///
/// One row per account. `public_id` is the share identifier guests see in
/// the wishlist URL; it is exposed as `celebrant_id` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CelebrantSettings {
    #[serde(skip_serializing, default)]
    pub account_id: Uuid,
    #[serde(rename = "celebrant_id")]
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

impl CelebrantSettings {
    pub const DEFAULT_ENABLE_WINE_SELECTION: bool = false;
    pub const DEFAULT_ENABLE_FLOWERS: bool = false;
    pub const DEFAULT_ENABLE_MONEY_GIFT: bool = true;

    /// Settings for a brand new account.
    pub fn defaults(account_id: Uuid, public_id: String) -> Self {
        Self {
            account_id,
            public_id,
            name: String::new(),
            age: None,
            profile_image: None,
            background_image: None,
            wishlist_title: None,
            wishlist_description: None,
            enable_wine_selection: Self::DEFAULT_ENABLE_WINE_SELECTION,
            enable_flowers: Self::DEFAULT_ENABLE_FLOWERS,
            enable_money_gift: Self::DEFAULT_ENABLE_MONEY_GIFT,
            updated_at: Utc::now(),
        }
    }

    /// Applies a validated update. The share id is never changed here.
    ///
    /// Optional profile fields are replaced (an absent value clears them),
    /// feature toggles keep their current value when absent.
    pub fn apply(&mut self, update: &UpdateSettingsRequest) {
        self.name = update.name.trim().to_string();
        self.age = update.age;
        self.profile_image = update.profile_image.clone();
        self.background_image = update.background_image.clone();
        self.wishlist_title = update.wishlist_title.clone();
        self.wishlist_description = update.wishlist_description.clone();
        if let Some(v) = update.enable_wine_selection {
            self.enable_wine_selection = v;
        }
        if let Some(v) = update.enable_flowers {
            self.enable_flowers = v;
        }
        if let Some(v) = update.enable_money_gift {
            self.enable_money_gift = v;
        }
        self.updated_at = Utc::now();
    }

    /// Name to show to guests.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "the celebrant"
        } else {
            self.name.as_str()
        }
    }
}

/// PUT request to update celebrant settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    pub age: Option<i32>,

    #[validate(custom(function = "shared::validation::validate_image_ref"))]
    pub profile_image: Option<String>,

    #[validate(custom(function = "shared::validation::validate_image_ref"))]
    pub background_image: Option<String>,

    #[validate(length(max = 200, message = "Wishlist title must be at most 200 characters"))]
    pub wishlist_title: Option<String>,

    #[validate(length(
        max = 2000,
        message = "Wishlist description must be at most 2000 characters"
    ))]
    pub wishlist_description: Option<String>,

    pub enable_wine_selection: Option<bool>,
    pub enable_flowers: Option<bool>,
    pub enable_money_gift: Option<bool>,
}

/// Public view of a wishlist, resolved from a share id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicWishlist {
    pub celebrant_settings: CelebrantSettings,
    pub wishlist_items: Vec<WishlistItem>,
}

/// Response after regenerating the share id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ShareIdResponse {
    pub celebrant_id: String,
}
