//! Money donation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{MoneyDonation, TransferType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for transfer_type that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "transfer_type", rename_all = "lowercase")]
pub enum TransferTypeDb {
    Belarus,
    International,
}

impl From<TransferTypeDb> for TransferType {
    fn from(db: TransferTypeDb) -> Self {
        match db {
            TransferTypeDb::Belarus => TransferType::Belarus,
            TransferTypeDb::International => TransferType::International,
        }
    }
}

impl From<TransferType> for TransferTypeDb {
    fn from(transfer_type: TransferType) -> Self {
        match transfer_type {
            TransferType::Belarus => TransferTypeDb::Belarus,
            TransferType::International => TransferTypeDb::International,
        }
    }
}

/// Database row mapping for the money_donations table.
#[derive(Debug, Clone, FromRow)]
pub struct MoneyDonationEntity {
    pub id: Uuid,
    pub celebrant_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub message: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub transfer_type: TransferTypeDb,
    pub created_at: DateTime<Utc>,
}

impl From<MoneyDonationEntity> for MoneyDonation {
    fn from(entity: MoneyDonationEntity) -> Self {
        Self {
            id: entity.id,
            celebrant_id: entity.celebrant_id,
            guest_name: entity.guest_name,
            guest_email: entity.guest_email,
            guest_phone: entity.guest_phone,
            message: entity.message,
            amount_minor: entity.amount_minor,
            currency: entity.currency,
            transfer_type: entity.transfer_type.into(),
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_type_conversion() {
        for t in [TransferType::Belarus, TransferType::International] {
            let db: TransferTypeDb = t.into();
            assert_eq!(TransferType::from(db), t);
        }
    }
}
