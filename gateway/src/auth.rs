//! Bearer-token verification.
//!
//! Tokens are issued by the external identity service; the gateway only
//! verifies them (HS256, shared secret) and turns the claims into the
//! explicit [`Principal`] handed to every core call.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use ik_core::types::{Principal, Role, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Claims carried by an identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    /// Role name, e.g. `CUSTOMER`.
    pub role: String,
    /// Stable login identifier (email or username).
    pub login: String,
    /// Expiry, seconds since the epoch.
    pub exp: u64
}

/// Verifies bearer tokens into principals.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256)
        }
    }

    /// Extracts and verifies the `Authorization: Bearer` token.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, ApiError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Authentication("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Authentication("malformed authorization header".to_string()))?;

        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| ApiError::Authentication(format!("invalid token: {e}")))?;

        let role: Role = data
            .claims
            .role
            .parse()
            .map_err(|_| ApiError::Authentication(format!("unknown role: {}", data.claims.role)))?;

        Ok(Principal::new(
            UserId::new(data.claims.sub),
            role,
            data.claims.login
        ))
    }
}
