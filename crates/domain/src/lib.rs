//! Domain layer for the Birthday Wishlist backend.
//!
//! This crate contains:
//! - Domain models (WishlistItem, Reservation, MoneyDonation, CelebrantSettings)
//! - The gift reservation planner and coordinator
//! - Notification and pending write abstractions

pub mod models;
pub mod services;
