//! Access gate: resolves the caller's user id from the request.
//!
//! The gateway never issues tokens or manages sessions. It only validates a
//! bearer token and reads the `user_id` claim; everything past this point
//! authorizes by bucket ownership.

use crate::{errors::AppError, state::AppState};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingHeader,
    #[error("Invalid authorization header format. Expected: Bearer <token>")]
    Malformed,
    #[error("Invalid or expired token")]
    InvalidToken,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthorized(match err {
            AuthError::MissingHeader => "Authorization header is required",
            AuthError::Malformed => "Invalid authorization header format. Expected: Bearer <token>",
            AuthError::InvalidToken => "Invalid or expired token",
        })
    }
}

/// Source of caller identity.
pub trait AccessGate: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<i64, AuthError>;
}

/// Claims the gateway reads from an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub exp: i64,
}

/// Validates HS256 bearer tokens signed with a shared secret.
pub struct JwtGate {
    key: DecodingKey,
    validation: Validation,
}

impl JwtGate {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl AccessGate for JwtGate {
    fn authenticate(&self, headers: &HeaderMap) -> Result<i64, AuthError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::Malformed)?;
        let token = value.strip_prefix("Bearer ").ok_or(AuthError::Malformed)?;

        if token.is_empty() || token.contains(' ') {
            return Err(AuthError::Malformed);
        }

        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.user_id)
            .map_err(|err| {
                tracing::debug!("token validation failed: {}", err);
                AuthError::InvalidToken
            })
    }
}

/// Authenticated caller, extracted from request headers via the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user_id = state.gate.authenticate(&parts.headers)?;
        Ok(AuthUser { user_id })
    }
}
