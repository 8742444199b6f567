//! Reservation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Reservation, SelectedItem};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the reservations table.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationEntity {
    pub id: Uuid,
    pub celebrant_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub message: Option<String>,
    pub selected_items: Json<Vec<SelectedItem>>,
    pub include_wine: bool,
    pub include_flowers: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ReservationEntity> for Reservation {
    fn from(entity: ReservationEntity) -> Self {
        Self {
            id: entity.id,
            celebrant_id: entity.celebrant_id,
            guest_name: entity.guest_name,
            guest_email: entity.guest_email,
            guest_phone: entity.guest_phone,
            message: entity.message,
            selected_items: entity.selected_items.0,
            include_wine: entity.include_wine,
            include_flowers: entity.include_flowers,
            created_at: entity.created_at,
        }
    }
}
