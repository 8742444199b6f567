//! Reservation domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

lazy_static::lazy_static! {
    pub static ref PHONE_REGEX: regex::Regex =
        regex::Regex::new(r"^\+?[0-9][0-9 ()-]{3,38}$").unwrap();
}

/// Validates an optional guest phone number (digits, spaces, dashes, parentheses).
pub fn validate_guest_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone may only contain digits, spaces, dashes and parentheses".into());
        Err(err)
    }
}

/// Snapshot of a selected item taken when the guest submits.
///
/// The title is kept as submitted even if the celebrant later renames or
/// deletes the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SelectedItem {
    pub id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Item title must be 1-200 characters"))]
    pub title: String,
}

/// A committed gift reservation. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Reservation {
    pub id: Uuid,
    #[serde(skip_serializing, default)]
    pub celebrant_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub message: Option<String>,
    pub selected_items: Vec<SelectedItem>,
    pub include_wine: bool,
    pub include_flowers: bool,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Titles of the reserved items in selection order.
    pub fn item_titles(&self) -> Vec<&str> {
        self.selected_items.iter().map(|i| i.title.as_str()).collect()
    }
}

/// Request body for creating a reservation.
///
/// `celebrant_id` is the internal account identifier. It is required on
/// `POST /api/v1/reservations` and ignored on the share id scoped route.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateReservationRequest {
    #[serde(default)]
    pub celebrant_id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub guest_name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    #[validate(length(max = 254, message = "Email is too long"))]
    pub guest_email: String,

    #[validate(length(max = 40, message = "Phone must be at most 40 characters"))]
    #[validate(custom(function = "validate_guest_phone"))]
    pub guest_phone: Option<String>,

    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Select between 1 and 50 items"))]
    #[validate(nested)]
    pub selected_items: Vec<SelectedItem>,

    #[serde(default)]
    pub include_wine: bool,

    #[serde(default)]
    pub include_flowers: bool,
}

/// Response after a successful reservation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReservationResponse {
    pub success: bool,
    pub reservation_id: Uuid,
    pub message: String,
}

impl ReservationResponse {
    pub fn confirmed(reservation_id: Uuid) -> Self {
        Self {
            success: true,
            reservation_id,
            message: "Reservation confirmed".to_string(),
        }
    }
}

/// Paginated reservation listing for the celebrant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListReservationsResponse {
    pub reservations: Vec<Reservation>,
    pub next_cursor: Option<String>,
}
