//! Authentication Models
//!
//! Data structures for authentication requests, responses, and user information.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;

/// A registered user as seen by the token codec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
}

/// Authenticated caller resolved from a bearer token, scoped to one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when the request passed through the auth middleware
        parts.extensions.get::<AuthUser>().copied().ok_or_else(|| {
            tracing::error!("AuthUser requested on a route without the auth middleware");
            AuthError::MalformedAuthHeader
        })
    }
}

/// Sign-in and sign-up payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Strip surrounding whitespace from the username; the password is kept verbatim
    pub fn trimmed(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self
    }

    /// Names of required fields that are absent or blank
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.username.is_empty() {
            missing.push("username");
        }
        if self.password.is_empty() {
            missing.push("password");
        }
        missing
    }
}

/// Refresh exchange payload
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Access/refresh token pair handed to clients
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Response body for a successful sign-up
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub message: String,
}

impl SignUpResponse {
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens,
            message: "successfully created user".to_string(),
        }
    }
}
