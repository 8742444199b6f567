//! Repository implementations for database operations.

pub mod celebrant;
pub mod celebrant_settings;
pub mod donation;
pub mod reservation;
pub mod wishlist_item;

pub use celebrant::CelebrantRepository;
pub use celebrant_settings::CelebrantSettingsRepository;
pub use donation::DonationRepository;
pub use reservation::{PgReservationStore, ReservationRepository, MAX_RESERVATION_ATTEMPTS};
pub use wishlist_item::WishlistItemRepository;
