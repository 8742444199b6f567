//! Celebrant authentication extractor.
//!
//! Admin routes accept a Bearer token issued by the identity provider. The
//! token subject is mapped to a celebrant account, created on first use.
//! Known mappings are cached so a verified token still identifies its owner
//! while the database is unreachable.

use std::collections::HashMap;
use std::sync::RwLock;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::services::WriteOwner;
use persistence::db::is_transient;
use persistence::repositories::CelebrantRepository;
use shared::jwt::JwtError;
use tracing::warn;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Subject to account id mappings seen since startup.
#[derive(Debug, Default)]
pub struct AccountCache {
    accounts: RwLock<HashMap<String, Uuid>>,
}

impl AccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: &str) -> Option<Uuid> {
        self.accounts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(subject)
            .copied()
    }

    pub fn insert(&self, subject: &str, celebrant_id: Uuid) {
        self.accounts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(subject.to_string(), celebrant_id);
    }

    pub fn len(&self) -> usize {
        self.accounts.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Authenticated celebrant.
#[derive(Debug, Clone)]
pub struct CelebrantAuth {
    /// Internal account id that owns the wishlist data. None when the
    /// account could not be looked up because the database is unavailable.
    pub celebrant_id: Option<Uuid>,
    /// Identity provider subject claim.
    pub subject: String,
    pub email: Option<String>,
}

impl CelebrantAuth {
    /// Account id for handlers that need the database anyway.
    pub fn account_id(&self) -> Result<Uuid, ApiError> {
        self.celebrant_id.ok_or_else(|| {
            ApiError::ServiceUnavailable("Celebrant account lookup unavailable".to_string())
        })
    }

    /// Owner recorded on writes parked in the pending write queue.
    pub fn owner(&self) -> WriteOwner {
        WriteOwner {
            subject: self.subject.clone(),
            email: self.email.clone(),
            celebrant_id: self.celebrant_id,
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for CelebrantAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<CelebrantAuth>() {
            return Ok(auth.clone());
        }

        let token = bearer_token(parts)?;
        let claims = state.jwt.verify(token).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            other => {
                tracing::debug!(error = %other, "Rejected admin token");
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
        })?;

        let email = claims
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        let celebrant_id = match state.accounts.get(&claims.sub) {
            Some(id) => Some(id),
            None => match CelebrantRepository::new(state.pool.clone())
                .get_or_create_by_subject(&claims.sub, email.as_deref())
                .await
            {
                Ok(account) => {
                    state.accounts.insert(&claims.sub, account.id);
                    Some(account.id)
                }
                Err(e) if is_transient(&e) => {
                    warn!(
                        error = %e,
                        "Celebrant account lookup unavailable, using token identity"
                    );
                    None
                }
                Err(e) => return Err(e.into()),
            },
        };

        let auth = CelebrantAuth {
            celebrant_id,
            subject: claims.sub,
            email,
        };
        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}
