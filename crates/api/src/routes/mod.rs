//! HTTP route handlers.

pub mod admin_dashboard;
pub mod admin_items;
pub mod admin_settings;
pub mod donations;
pub mod health;
pub mod letters;
pub mod public_wishlist;
pub mod queued;
pub mod reservations;
