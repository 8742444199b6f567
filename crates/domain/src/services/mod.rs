//! Domain services for the Birthday Wishlist.
//!
//! Services contain business logic that operates on domain models.

pub mod notification;
pub mod pending_writes;
pub mod reservation;

pub use notification::{
    dispatch_donation, dispatch_reservation, MockNotificationService, NotificationResult,
    NotificationService, NotificationType,
};

pub use pending_writes::{
    MutationSink, PendingMutation, PendingWrite, PendingWriteQueue, QueueError, ReplayError,
    ReplayReport, WriteOwner,
};

pub use reservation::{
    plan_reservation, validate_draft, InMemoryReservationStore, ItemStock, ReservationCoordinator,
    ReservationDraft, ReservationError, ReservationPlan, ReservationStore, StockUpdate,
};
