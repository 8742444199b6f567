//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod celebrant;
pub mod donation;
pub mod reservation;
pub mod wishlist_item;

pub use celebrant::{CelebrantEntity, CelebrantSettingsEntity};
pub use donation::{MoneyDonationEntity, TransferTypeDb};
pub use reservation::ReservationEntity;
pub use wishlist_item::{ItemStockEntity, WishlistItemEntity};
