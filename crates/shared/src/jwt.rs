//! Identity provider token verification.
//!
//! Celebrants sign in through an external identity provider. The backend
//! never issues tokens, it only verifies the bearer tokens the provider
//! hands out: RS256 against the provider's public key in production, or
//! HS256 with a shared secret for local development and tests.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for token verification.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Claims we rely on from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (stable account identifier at the provider)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Email address, if the provider includes it
    #[serde(default)]
    pub email: Option<String>,
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Verifies identity provider tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: Option<String>,
    audience: Option<String>,
    leeway_secs: u64,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtVerifier {
    /// Creates a verifier for RS256 tokens from the provider's public key in PEM format.
    pub fn rs256(public_key_pem: &str) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self::with_key(decoding_key, Algorithm::RS256))
    }

    /// Creates a verifier for HS256 tokens signed with a shared secret.
    pub fn hs256(secret: &str) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("Shared secret is empty".to_string()));
        }
        Ok(Self::with_key(
            DecodingKey::from_secret(secret.as_bytes()),
            Algorithm::HS256,
        ))
    }

    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        Self {
            decoding_key,
            algorithm,
            issuer: None,
            audience: None,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    /// Requires the `iss` claim to match.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Requires the `aud` claim to match.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Overrides the clock skew leeway.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Verifies a token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidIssuer
                | jsonwebtoken::errors::ErrorKind::InvalidAudience
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(JwtError::InvalidToken);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test_secret_key_for_jwt_testing_12345";

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: i64,
        iat: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aud: Option<&'a str>,
    }

    fn sign(claims: &TestClaims<'_>, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_for(sub: &str, expires_in: i64) -> TestClaims<'_> {
        let now = Utc::now();
        TestClaims {
            sub,
            exp: (now + Duration::seconds(expires_in)).timestamp(),
            iat: now.timestamp(),
            email: Some("owner@example.com"),
            iss: None,
            aud: None,
        }
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::hs256(SECRET).unwrap().with_leeway(0)
    }

    #[test]
    fn test_verify_valid_token() {
        let token = sign(&claims_for("firebase-uid-1", 300), SECRET);
        let claims = verifier().verify(&token).unwrap();

        assert_eq!(claims.sub, "firebase-uid-1");
        assert_eq!(claims.email.as_deref(), Some("owner@example.com"));
    }

    #[test]
    fn test_verify_expired_token() {
        let token = sign(&claims_for("firebase-uid-1", -120), SECRET);
        let result = verifier().verify(&token);

        assert!(
            matches!(result, Err(JwtError::TokenExpired)),
            "Expected TokenExpired, got: {:?}",
            result
        );
    }

    #[test]
    fn test_verify_wrong_secret() {
        let token = sign(&claims_for("firebase-uid-1", 300), "another_secret");
        let result = verifier().verify(&token);

        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_verify_malformed_token() {
        assert!(verifier().verify("not_a_jwt").is_err());
        assert!(verifier().verify("invalid.token.here").is_err());
    }

    #[test]
    fn test_verify_issuer_mismatch() {
        let mut claims = claims_for("firebase-uid-1", 300);
        claims.iss = Some("https://someone-else.example.com");
        let token = sign(&claims, SECRET);

        let result = verifier()
            .with_issuer("https://securetoken.google.com/wishlist")
            .verify(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_verify_audience_match() {
        let mut claims = claims_for("firebase-uid-1", 300);
        claims.aud = Some("wishlist");
        let token = sign(&claims, SECRET);

        let claims = verifier().with_audience("wishlist").verify(&token).unwrap();
        assert_eq!(claims.sub, "firebase-uid-1");
    }

    #[test]
    fn test_verify_blank_subject_rejected() {
        let token = sign(&claims_for("  ", 300), SECRET);
        assert!(matches!(
            verifier().verify(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            JwtVerifier::hs256(""),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_invalid_rsa_key_rejected() {
        assert!(matches!(
            JwtVerifier::rs256("not a pem"),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", verifier());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(SECRET));
    }

    #[test]
    fn test_jwt_error_display() {
        assert!(format!("{}", JwtError::TokenExpired).contains("expired"));
        assert!(format!("{}", JwtError::InvalidToken).contains("Invalid"));
        assert!(format!("{}", JwtError::DecodingError("test".to_string())).contains("decode"));
    }
}
