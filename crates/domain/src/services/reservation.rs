//! Gift reservation planning and coordination.
//!
//! A reservation is decided in two phases. [`plan_reservation`] is a pure
//! function over a snapshot of the selected items' stock: it either rejects
//! the whole selection or returns the reservation record together with the
//! new counter values. A [`ReservationStore`] takes the snapshot, runs the
//! planner and applies the plan atomically.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{CreateReservationRequest, Reservation, SelectedItem};
use crate::services::notification::{self, NotificationService};

/// Reservation failure taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Item is no longer available: {title}")]
    OutOfStock { item_id: Uuid, title: String },

    #[error("Reservation backend unavailable: {0}")]
    TransientBackendFailure(String),
}

/// A guest's reservation attempt, before it touches storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDraft {
    pub celebrant_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub message: Option<String>,
    pub selected_items: Vec<SelectedItem>,
    pub include_wine: bool,
    pub include_flowers: bool,
}

impl ReservationDraft {
    /// Builds a draft from a validated request.
    pub fn from_request(celebrant_id: Uuid, request: CreateReservationRequest) -> Self {
        Self {
            celebrant_id,
            guest_name: request.guest_name.trim().to_string(),
            guest_email: request.guest_email.trim().to_lowercase(),
            guest_phone: non_empty(request.guest_phone),
            message: non_empty(request.message),
            selected_items: request
                .selected_items
                .into_iter()
                .map(|item| SelectedItem {
                    id: item.id,
                    title: item.title.trim().to_string(),
                })
                .collect(),
            include_wine: request.include_wine,
            include_flowers: request.include_flowers,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Checks the draft shape. Runs before any storage access.
pub fn validate_draft(draft: &ReservationDraft) -> Result<(), ReservationError> {
    if draft.guest_name.trim().is_empty() {
        return Err(ReservationError::Validation(
            "guest_name is required".to_string(),
        ));
    }
    if draft.guest_email.trim().is_empty() || !draft.guest_email.contains('@') {
        return Err(ReservationError::Validation(
            "guest_email must be a valid email address".to_string(),
        ));
    }
    if draft.selected_items.is_empty() {
        return Err(ReservationError::Validation(
            "selected_items must contain at least one item".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(draft.selected_items.len());
    for item in &draft.selected_items {
        if !seen.insert(item.id) {
            return Err(ReservationError::Validation(format!(
                "Item {} is selected more than once",
                item.id
            )));
        }
    }

    Ok(())
}

/// Current counters of one item, as read inside the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStock {
    pub id: Uuid,
    pub quantity: i32,
    pub reserved: i32,
}

/// New counter values for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockUpdate {
    pub item_id: Uuid,
    pub quantity: i32,
    pub reserved: i32,
}

/// Everything a store has to write to commit a reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationPlan {
    pub reservation: Reservation,
    /// Counter updates, ordered by item id.
    pub updates: Vec<StockUpdate>,
}

/// Decides a reservation against a stock snapshot.
///
/// The snapshot holds the items of the draft's celebrant that were found;
/// a selected id missing from it does not exist for that celebrant. Every
/// selected item is checked for existence before any is checked for stock,
/// and any failure rejects the whole selection.
pub fn plan_reservation(
    draft: &ReservationDraft,
    snapshot: &[ItemStock],
) -> Result<ReservationPlan, ReservationError> {
    validate_draft(draft)?;

    let stock: HashMap<Uuid, &ItemStock> = snapshot.iter().map(|s| (s.id, s)).collect();

    let mut found = Vec::with_capacity(draft.selected_items.len());
    for selected in &draft.selected_items {
        match stock.get(&selected.id) {
            Some(item) => found.push((selected, *item)),
            None => return Err(ReservationError::ItemNotFound(selected.id)),
        }
    }

    if let Some((selected, _)) = found.iter().find(|(_, item)| item.quantity <= 0) {
        return Err(ReservationError::OutOfStock {
            item_id: selected.id,
            title: selected.title.clone(),
        });
    }

    let mut updates: Vec<StockUpdate> = found
        .iter()
        .map(|(_, item)| StockUpdate {
            item_id: item.id,
            quantity: item.quantity - 1,
            reserved: item.reserved + 1,
        })
        .collect();
    updates.sort_by_key(|u| u.item_id);

    let reservation = Reservation {
        id: Uuid::new_v4(),
        celebrant_id: draft.celebrant_id,
        guest_name: draft.guest_name.clone(),
        guest_email: draft.guest_email.clone(),
        guest_phone: draft.guest_phone.clone(),
        message: draft.message.clone(),
        selected_items: draft.selected_items.clone(),
        include_wine: draft.include_wine,
        include_flowers: draft.include_flowers,
        created_at: Utc::now(),
    };

    Ok(ReservationPlan {
        reservation,
        updates,
    })
}

/// Storage that can commit a reservation atomically.
///
/// Implementations read the selected items of the draft's celebrant, call
/// [`plan_reservation`] and apply the plan as one unit, or leave no trace.
#[async_trait::async_trait]
pub trait ReservationStore: Send + Sync {
    async fn reserve(&self, draft: &ReservationDraft) -> Result<Reservation, ReservationError>;
}

#[derive(Debug, Default)]
struct InMemoryState {
    /// item id -> (owning celebrant, stock)
    items: HashMap<Uuid, (Uuid, ItemStock)>,
    reservations: Vec<Reservation>,
}

/// Reservation store backed by process memory, serialized by a mutex.
#[derive(Debug, Default)]
pub struct InMemoryReservationStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an item.
    pub fn put_item(&self, celebrant_id: Uuid, item_id: Uuid, quantity: i32, reserved: i32) {
        if let Ok(mut state) = self.state.lock() {
            state.items.insert(
                item_id,
                (
                    celebrant_id,
                    ItemStock {
                        id: item_id,
                        quantity,
                        reserved,
                    },
                ),
            );
        }
    }

    /// Current stock of an item.
    pub fn stock(&self, item_id: Uuid) -> Option<ItemStock> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.items.get(&item_id).map(|(_, stock)| *stock))
    }

    /// Committed reservations, oldest first.
    pub fn reservations(&self) -> Vec<Reservation> {
        self.state
            .lock()
            .map(|state| state.reservations.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn reserve(&self, draft: &ReservationDraft) -> Result<Reservation, ReservationError> {
        let mut state = self.state.lock().map_err(|_| {
            ReservationError::TransientBackendFailure("store lock poisoned".to_string())
        })?;

        let snapshot: Vec<ItemStock> = draft
            .selected_items
            .iter()
            .filter_map(|selected| state.items.get(&selected.id))
            .filter(|(owner, _)| *owner == draft.celebrant_id)
            .map(|(_, stock)| *stock)
            .collect();

        let plan = plan_reservation(draft, &snapshot)?;

        for update in &plan.updates {
            if let Some((_, stock)) = state.items.get_mut(&update.item_id) {
                stock.quantity = update.quantity;
                stock.reserved = update.reserved;
            }
        }
        state.reservations.push(plan.reservation.clone());

        Ok(plan.reservation)
    }
}

/// Entry point for guest reservations.
///
/// Validates the draft, commits it through the store, then hands the
/// committed record to the notifier on a detached task.
#[derive(Clone)]
pub struct ReservationCoordinator {
    store: Arc<dyn ReservationStore>,
    notifier: Arc<dyn NotificationService>,
}

impl ReservationCoordinator {
    pub fn new(store: Arc<dyn ReservationStore>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { store, notifier }
    }

    pub async fn submit(&self, draft: ReservationDraft) -> Result<Reservation, ReservationError> {
        validate_draft(&draft)?;

        let reservation = match self.store.reserve(&draft).await {
            Ok(reservation) => reservation,
            Err(e) => {
                warn!(
                    celebrant_id = %draft.celebrant_id,
                    items = draft.selected_items.len(),
                    error = %e,
                    "Reservation rejected"
                );
                return Err(e);
            }
        };

        info!(
            reservation_id = %reservation.id,
            celebrant_id = %reservation.celebrant_id,
            items = reservation.selected_items.len(),
            "Reservation committed"
        );

        notification::dispatch_reservation(self.notifier.clone(), reservation.clone());

        Ok(reservation)
    }
}
