//! Wishlist item domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A gift on a celebrant's wishlist.
///
/// `quantity` is the remaining unreserved stock, `reserved` counts units
/// claimed so far. Only the reservation transaction changes either counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct WishlistItem {
    pub id: Uuid,
    #[serde(skip_serializing, default)]
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

impl WishlistItem {
    /// Returns true if at least one unit can still be reserved.
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// Request to add an item to the wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,

    #[validate(custom(function = "shared::validation::validate_image_ref"))]
    pub image: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    pub category: Option<String>,

    /// Initial stock
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// Request to edit an item's display metadata.
///
/// Unknown fields, including `quantity` and `reserved`, are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "shared::validation::validate_image_ref"))]
    pub image: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    pub category: Option<String>,
}

impl UpdateItemRequest {
    /// Returns true if the request would not change anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.category.is_none()
    }
}

/// Response for item listing endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListItemsResponse {
    pub items: Vec<WishlistItem>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> WishlistItem {
        WishlistItem {
            id: Uuid::new_v4(),
            celebrant_id: Uuid::new_v4(),
            title: "Vintage Camera".to_string(),
            description: "A film camera".to_string(),
            image: Some("/vintage-camera.png".to_string()),
            category: Some("Tech".to_string()),
            quantity: 1,
            reserved: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_item_serialization_hides_owner() {
        let item = sample_item();
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"title\":\"Vintage Camera\""));
        assert!(json.contains("\"quantity\":1"));
        assert!(!json.contains("celebrant_id"));
    }

    #[test]
    fn test_is_available() {
        let mut item = sample_item();
        assert!(item.is_available());
        item.quantity = 0;
        assert!(!item.is_available());
    }

    #[test]
    fn test_create_request_defaults() {
        let json = r#"{"title": "Perfume"}"#;
        let request: CreateItemRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.quantity, 1);
        assert_eq!(request.description, "");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_validation() {
        let blank: CreateItemRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        assert!(blank.validate().is_err());

        let zero: CreateItemRequest =
            serde_json::from_str(r#"{"title": "Book", "quantity": 0}"#).unwrap();
        assert!(zero.validate().is_err());

        let bad_image: CreateItemRequest =
            serde_json::from_str(r#"{"title": "Book", "image": "ftp://x/y.png"}"#).unwrap();
        assert!(bad_image.validate().is_err());
    }

    #[test]
    fn test_update_request_rejects_stock_fields() {
        let result: Result<UpdateItemRequest, _> =
            serde_json::from_str(r#"{"title": "New", "quantity": 10}"#);
        assert!(result.is_err());

        let result: Result<UpdateItemRequest, _> = serde_json::from_str(r#"{"reserved": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_request_is_empty() {
        let request: UpdateItemRequest = serde_json::from_str("{}").unwrap();
        assert!(request.is_empty());

        let request: UpdateItemRequest =
            serde_json::from_str(r#"{"category": "Beauty"}"#).unwrap();
        assert!(!request.is_empty());
        assert!(request.validate().is_ok());
    }
}
