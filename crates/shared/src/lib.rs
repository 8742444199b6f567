//! Shared utilities and common types for the Birthday Wishlist backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Public share identifier generation
//! - Cursor-based pagination helpers
//! - Common validation logic
//! - Identity provider token verification

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod validation;
