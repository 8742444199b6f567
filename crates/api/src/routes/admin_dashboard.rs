//! Celebrant dashboard: reservation and donation listings, totals and export.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::donation::ListDonationsResponse;
use domain::models::reservation::ListReservationsResponse;
use domain::models::{
    CelebrantSettings, DashboardSummary, ExportDocument, MoneyDonation, Reservation, WishlistItem,
};
use persistence::repositories::{
    CelebrantSettingsRepository, DonationRepository, ReservationRepository,
    WishlistItemRepository,
};
use serde::Deserialize;
use shared::pagination::{clamp_limit, decode_cursor, encode_cursor};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CelebrantAuth;

/// Query parameters for cursor paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

impl PageQuery {
    fn after(&self) -> Result<Option<(DateTime<Utc>, Uuid)>, ApiError> {
        match self.cursor.as_deref().filter(|c| !c.is_empty()) {
            Some(cursor) => Ok(Some(decode_cursor(cursor)?)),
            None => Ok(None),
        }
    }
}

/// Trims the look-ahead row and returns the cursor of the last kept row.
fn split_page<T>(
    mut rows: Vec<T>,
    limit: i64,
    key: impl Fn(&T) -> (DateTime<Utc>, Uuid),
) -> (Vec<T>, Option<String>) {
    let limit = limit as usize;
    if rows.len() <= limit {
        return (rows, None);
    }
    rows.truncate(limit);
    let next_cursor = rows.last().map(|row| {
        let (created_at, id) = key(row);
        encode_cursor(created_at, id)
    });
    (rows, next_cursor)
}

/// List reservations, newest first.
///
/// GET /api/v1/admin/reservations
pub async fn list_reservations(
    State(state): State<AppState>,
    auth: CelebrantAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListReservationsResponse>, ApiError> {
    let limit = clamp_limit(query.limit);
    let after = query.after()?;

    let rows: Vec<Reservation> = ReservationRepository::new(state.pool.clone())
        .list_page(auth.account_id()?, after, limit + 1)
        .await?
        .into_iter()
        .map(Reservation::from)
        .collect();

    let (reservations, next_cursor) = split_page(rows, limit, |r| (r.created_at, r.id));
    Ok(Json(ListReservationsResponse {
        reservations,
        next_cursor,
    }))
}

/// List money gifts, newest first.
///
/// GET /api/v1/admin/donations
pub async fn list_donations(
    State(state): State<AppState>,
    auth: CelebrantAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListDonationsResponse>, ApiError> {
    let limit = clamp_limit(query.limit);
    let after = query.after()?;

    let rows: Vec<MoneyDonation> = DonationRepository::new(state.pool.clone())
        .list_page(auth.account_id()?, after, limit + 1)
        .await?
        .into_iter()
        .map(MoneyDonation::from)
        .collect();

    let (donations, next_cursor) = split_page(rows, limit, |d| (d.created_at, d.id));
    Ok(Json(ListDonationsResponse {
        donations,
        next_cursor,
    }))
}

struct DashboardData {
    reservations: Vec<Reservation>,
    donations: Vec<MoneyDonation>,
    items: Vec<WishlistItem>,
}

async fn load_dashboard_data(
    state: &AppState,
    celebrant_id: Uuid,
) -> Result<DashboardData, ApiError> {
    let reservations = ReservationRepository::new(state.pool.clone())
        .list_all(celebrant_id)
        .await?
        .into_iter()
        .map(Reservation::from)
        .collect();
    let donations = DonationRepository::new(state.pool.clone())
        .list_all(celebrant_id)
        .await?
        .into_iter()
        .map(MoneyDonation::from)
        .collect();
    let items = WishlistItemRepository::new(state.pool.clone())
        .list_by_celebrant(celebrant_id)
        .await?
        .into_iter()
        .map(WishlistItem::from)
        .collect();

    Ok(DashboardData {
        reservations,
        donations,
        items,
    })
}

/// Totals across reservations, money gifts and items.
///
/// GET /api/v1/admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    auth: CelebrantAuth,
) -> Result<Json<DashboardSummary>, ApiError> {
    let data = load_dashboard_data(&state, auth.account_id()?).await?;
    Ok(Json(DashboardSummary::compute(
        &data.reservations,
        &data.donations,
        &data.items,
    )))
}

/// Download everything as a JSON attachment.
///
/// GET /api/v1/admin/export
pub async fn export(
    State(state): State<AppState>,
    auth: CelebrantAuth,
) -> Result<Response, ApiError> {
    let celebrant_id = auth.account_id()?;
    let data = load_dashboard_data(&state, celebrant_id).await?;
    let celebrant_settings = CelebrantSettingsRepository::new(state.pool.clone())
        .find_by_celebrant(celebrant_id)
        .await?
        .map(CelebrantSettings::from);

    let exported_at = Utc::now();
    let summary = DashboardSummary::compute(&data.reservations, &data.donations, &data.items);
    let document = ExportDocument {
        exported_at,
        celebrant_settings,
        reservations: data.reservations,
        donations: data.donations,
        summary,
    };

    info!(
        celebrant_id = %celebrant_id,
        reservations = document.reservations.len(),
        donations = document.donations.len(),
        "Data export generated"
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        ExportDocument::filename(exported_at.date_naive())
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(document)).into_response())
}
