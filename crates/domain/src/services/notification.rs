//! Notification service for guest and celebrant e-mails.
//!
//! Notifications are side effects of committed writes. They run on a
//! detached task and never change the outcome of the request that
//! triggered them.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{MoneyDonation, Reservation};

/// Notification kind, used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    ReservationConfirmed,
    DonationPledged,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::ReservationConfirmed => write!(f, "reservation_confirmed"),
            NotificationType::DonationPledged => write!(f, "donation_pledged"),
        }
    }
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Guest and admin messages were sent.
    Sent,
    /// Notifications are disabled.
    Skipped,
    /// Sending failed (non-blocking).
    Failed(String),
}

/// Sends the e-mails that follow a reservation or donation.
#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Guest confirmation plus celebrant/admin alert for a reservation.
    async fn reservation_confirmed(&self, reservation: &Reservation) -> NotificationResult;

    /// Transfer instructions to the guest plus celebrant/admin alert.
    async fn donation_pledged(&self, donation: &MoneyDonation) -> NotificationResult;
}

fn log_result(kind: NotificationType, record_id: Uuid, result: &NotificationResult) {
    match result {
        NotificationResult::Sent => {
            info!(notification = %kind, record_id = %record_id, "Notification sent")
        }
        NotificationResult::Skipped => {
            info!(notification = %kind, record_id = %record_id, "Notification skipped")
        }
        NotificationResult::Failed(reason) => warn!(
            notification = %kind,
            record_id = %record_id,
            error = %reason,
            "Notification failed"
        ),
    }
}

/// Spawns reservation notifications on a detached task.
pub fn dispatch_reservation(
    notifier: Arc<dyn NotificationService>,
    reservation: Reservation,
) -> JoinHandle<NotificationResult> {
    tokio::spawn(async move {
        let result = notifier.reservation_confirmed(&reservation).await;
        log_result(NotificationType::ReservationConfirmed, reservation.id, &result);
        result
    })
}

/// Spawns donation notifications on a detached task.
pub fn dispatch_donation(
    notifier: Arc<dyn NotificationService>,
    donation: MoneyDonation,
) -> JoinHandle<NotificationResult> {
    tokio::spawn(async move {
        let result = notifier.donation_pledged(&donation).await;
        log_result(NotificationType::DonationPledged, donation.id, &result);
        result
    })
}

/// Mock notification service for development and testing.
///
/// Records the ids it was asked to notify about instead of sending anything.
#[derive(Debug, Default)]
pub struct MockNotificationService {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Mutex<Vec<(NotificationType, Uuid)>>,
}

impl MockNotificationService {
    /// Create a new mock notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock service that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Notifications recorded so far.
    pub fn sent(&self) -> Vec<(NotificationType, Uuid)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, kind: NotificationType, id: Uuid) -> NotificationResult {
        if self.simulate_failure {
            return NotificationResult::Failed(
                "Mock notification service simulating failure".to_string(),
            );
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((kind, id));
        }
        NotificationResult::Sent
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn reservation_confirmed(&self, reservation: &Reservation) -> NotificationResult {
        self.record(NotificationType::ReservationConfirmed, reservation.id)
    }

    async fn donation_pledged(&self, donation: &MoneyDonation) -> NotificationResult {
        self.record(NotificationType::DonationPledged, donation.id)
    }
}
