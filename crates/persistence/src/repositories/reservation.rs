//! Reservation ledger repository and the transactional reservation store.

use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::models::Reservation;
use domain::services::{
    plan_reservation, ItemStock, ReservationDraft, ReservationError, ReservationStore,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, warn};
use uuid::Uuid;

use crate::db::{is_retryable_conflict, is_transient};
use crate::entities::{ItemStockEntity, ReservationEntity};
use crate::metrics::{record_transaction_retry, QueryTimer};

/// Attempts per reservation before a lock conflict is reported as transient.
pub const MAX_RESERVATION_ATTEMPTS: u32 = 3;

const RETRY_BACKOFF: Duration = Duration::from_millis(25);

const RESERVATION_COLUMNS: &str = "id, celebrant_id, guest_name, guest_email, guest_phone, \
     message, selected_items, include_wine, include_flowers, created_at";

/// Repository for reading the reservation ledger.
#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists reservations newest first, starting after the cursor position.
    ///
    /// Fetches up to `limit` rows; the caller passes `limit + 1` to detect a
    /// following page.
    pub async fn list_page(
        &self,
        celebrant_id: Uuid,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<ReservationEntity>, sqlx::Error> {
        let (cursor_ts, cursor_id) = after.unzip();
        let timer = QueryTimer::new("list_reservations_page");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
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

    /// Lists every reservation of a celebrant, newest first.
    pub async fn list_all(
        &self,
        celebrant_id: Uuid,
    ) -> Result<Vec<ReservationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_reservations");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
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

/// Why a single transaction attempt ended without a commit.
enum AttemptError {
    /// The planner rejected the selection; nothing was written.
    Rejected(ReservationError),
    Database(sqlx::Error),
}

impl From<sqlx::Error> for AttemptError {
    fn from(e: sqlx::Error) -> Self {
        AttemptError::Database(e)
    }
}

/// Postgres implementation of the reservation store.
///
/// Each attempt locks the selected item rows in id order with
/// `SELECT ... FOR UPDATE`, plans against the locked snapshot, then inserts
/// the ledger row and writes the new counters before committing. Deadlocks
/// and serialization failures retry the whole attempt.
#[derive(Clone)]
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_items(
        tx: &mut Transaction<'_, Postgres>,
        draft: &ReservationDraft,
    ) -> Result<Vec<ItemStock>, sqlx::Error> {
        let mut ids: Vec<Uuid> = draft.selected_items.iter().map(|i| i.id).collect();
        ids.sort();
        ids.dedup();

        let timer = QueryTimer::new("lock_reservation_items");
        let rows = sqlx::query_as::<_, ItemStockEntity>(
            r#"
            SELECT id, quantity, reserved
            FROM wishlist_items
            WHERE celebrant_id = $1 AND id = ANY($2)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(draft.celebrant_id)
        .bind(&ids)
        .fetch_all(&mut **tx)
        .await;
        timer.record();

        Ok(rows?.into_iter().map(ItemStock::from).collect())
    }

    async fn attempt(&self, draft: &ReservationDraft) -> Result<Reservation, AttemptError> {
        let mut tx = self.pool.begin().await?;

        let snapshot = Self::lock_items(&mut tx, draft).await?;

        let plan = match plan_reservation(draft, &snapshot) {
            Ok(plan) => plan,
            Err(e) => {
                tx.rollback().await?;
                return Err(AttemptError::Rejected(e));
            }
        };

        let reservation = &plan.reservation;
        let timer = QueryTimer::new("insert_reservation");
        let inserted = sqlx::query(
            r#"
            INSERT INTO reservations (
                id, celebrant_id, guest_name, guest_email, guest_phone, message,
                selected_items, include_wine, include_flowers, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.celebrant_id)
        .bind(&reservation.guest_name)
        .bind(&reservation.guest_email)
        .bind(&reservation.guest_phone)
        .bind(&reservation.message)
        .bind(Json(&reservation.selected_items))
        .bind(reservation.include_wine)
        .bind(reservation.include_flowers)
        .bind(reservation.created_at)
        .execute(&mut *tx)
        .await;
        timer.record();
        inserted?;

        for update in &plan.updates {
            let timer = QueryTimer::new("update_item_stock");
            let updated = sqlx::query(
                r#"
                UPDATE wishlist_items
                SET quantity = $2, reserved = $3, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(update.item_id)
            .bind(update.quantity)
            .bind(update.reserved)
            .execute(&mut *tx)
            .await;
            timer.record();
            updated?;
        }

        tx.commit().await?;

        Ok(plan.reservation)
    }
}

#[async_trait::async_trait]
impl ReservationStore for PgReservationStore {
    async fn reserve(&self, draft: &ReservationDraft) -> Result<Reservation, ReservationError> {
        let mut attempt = 1;
        loop {
            match self.attempt(draft).await {
                Ok(reservation) => return Ok(reservation),
                Err(AttemptError::Rejected(e)) => return Err(e),
                Err(AttemptError::Database(e))
                    if is_retryable_conflict(&e) && attempt < MAX_RESERVATION_ATTEMPTS =>
                {
                    warn!(
                        celebrant_id = %draft.celebrant_id,
                        attempt,
                        error = %e,
                        "Reservation transaction conflict, retrying"
                    );
                    record_transaction_retry("reservation");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(AttemptError::Database(e)) => {
                    if is_transient(&e) {
                        warn!(
                            celebrant_id = %draft.celebrant_id,
                            error = %e,
                            "Reservation backend unavailable"
                        );
                    } else {
                        error!(
                            celebrant_id = %draft.celebrant_id,
                            error = %e,
                            "Reservation transaction failed"
                        );
                    }
                    return Err(ReservationError::TransientBackendFailure(e.to_string()));
                }
            }
        }
    }
}
