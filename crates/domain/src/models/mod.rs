//! Domain models for the Birthday Wishlist.

pub mod celebrant;
pub mod dashboard;
pub mod donation;
pub mod letter;
pub mod reservation;
pub mod wishlist_item;

pub use celebrant::{CelebrantAccount, CelebrantSettings, PublicWishlist, UpdateSettingsRequest};
pub use dashboard::{DashboardSummary, ExportDocument};
pub use donation::{CreateDonationRequest, MoneyDonation, NewDonation, TransferType};
pub use letter::{GenerateLetterRequest, LetterStyle, Relationship};
pub use reservation::{CreateReservationRequest, Reservation, SelectedItem};
pub use wishlist_item::{CreateItemRequest, UpdateItemRequest, WishlistItem};
