//! Persistence layer for the Birthday Wishlist backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional reservation store
//! - SQL migrations

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
