//! Repository for money donation operations.

use chrono::{DateTime, Utc};
use domain::models::NewDonation;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{MoneyDonationEntity, TransferTypeDb};
use crate::metrics::QueryTimer;

const DONATION_COLUMNS: &str = "id, celebrant_id, guest_name, guest_email, guest_phone, \
     message, amount_minor, currency, transfer_type, created_at";

/// Repository for money donation database operations.
#[derive(Clone)]
pub struct DonationRepository {
    pool: PgPool,
}

impl DonationRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records a donation pledge with a single insert.
    pub async fn create(&self, donation: &NewDonation) -> Result<MoneyDonationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_money_donation");
        let result = sqlx::query_as::<_, MoneyDonationEntity>(&format!(
            r#"
            INSERT INTO money_donations (
                celebrant_id, guest_name, guest_email, guest_phone, message,
                amount_minor, currency, transfer_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(donation.celebrant_id)
        .bind(&donation.guest_name)
        .bind(&donation.guest_email)
        .bind(&donation.guest_phone)
        .bind(&donation.message)
        .bind(donation.amount_minor)
        .bind(&donation.currency)
        .bind(TransferTypeDb::from(donation.transfer_type))
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists donations newest first, starting after the cursor position.
    pub async fn list_page(
        &self,
        celebrant_id: Uuid,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<MoneyDonationEntity>, sqlx::Error> {
        let (cursor_ts, cursor_id) = after.unzip();
        let timer = QueryTimer::new("list_donations_page");
        let result = sqlx::query_as::<_, MoneyDonationEntity>(&format!(
            r#"
            SELECT {DONATION_COLUMNS}
            FROM money_donations
            WHERE celebrant_id = $1
              AND ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3))
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#
        ))
        .bind(celebrant_id)
        .bind(cursor_ts)
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists every donation of a celebrant, newest first.
    pub async fn list_all(
        &self,
        celebrant_id: Uuid,
    ) -> Result<Vec<MoneyDonationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_donations");
        let result = sqlx::query_as::<_, MoneyDonationEntity>(&format!(
            r#"
            SELECT {DONATION_COLUMNS}
            FROM money_donations
            WHERE celebrant_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(celebrant_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
