//! Authentication Middleware
//!
//! Axum middleware for JWT token validation and user authentication.
//!
//! The gate is strictly sequential and stops at the first failure:
//! header shape, then signature/algorithm, then claims and expiry. Only a
//! request that passes all three reaches the wrapped handler, carrying an
//! [`AuthUser`] in its extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{error::AuthError, jwt::TokenCodec, models::AuthUser};

/// Authentication middleware that validates JWT tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for validating JWT tokens
    pub async fn validate_token(
        State(codec): State<Arc<TokenCodec>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, AuthError> {
        tracing::debug!("[AuthMiddleware] Incoming request: {} {}", req.method(), req.uri());

        let token = bearer_token(req.headers()).inspect_err(|_| {
            tracing::debug!("[AuthMiddleware] Missing bearer or token value");
        })?;

        if let Err(e) = codec.verify(token) {
            tracing::info!("[AuthMiddleware] Unauthorized or unreadable token: {}", e);
            return Err(e);
        }

        let id = codec.extract_subject(token).inspect_err(|e| {
            tracing::info!("[AuthMiddleware] Failed to read token claims: {}", e);
        })?;

        req.extensions_mut().insert(AuthUser { id });

        Ok(next.run(req).await)
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The header must split on single spaces into exactly two parts.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MalformedAuthHeader)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => Ok(*token),
        _ => Err(AuthError::MalformedAuthHeader),
    }
}
