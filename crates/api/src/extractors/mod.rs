//! Custom Axum extractors.

pub mod celebrant_auth;

pub use celebrant_auth::{AccountCache, CelebrantAuth};
