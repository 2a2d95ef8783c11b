//! Authentication Errors
//!
//! Every failure the token codec, the auth middleware and the sign-in flow
//! can produce. Each variant maps to a status code and a `{"error": ...}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// `Authorization` header missing or not of the form `Bearer <token>`
    #[error("invalid token")]
    MalformedAuthHeader,

    /// Encoding, signature or algorithm check failed
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    Expired,

    #[error("missing uuid in claims")]
    MissingClaim,

    /// Sign-in found no user for the given username/password pair
    #[error("unable to locate user")]
    CredentialMismatch,

    #[error("username already exists")]
    DuplicateIdentity,

    #[error("failed to create token")]
    SigningFailure(#[source] jsonwebtoken::errors::Error),

    /// Issue time plus lifetime does not fit in a timestamp
    #[error("failed to create token")]
    ExpiryOutOfRange,

    #[error("credential store unavailable")]
    Store(#[source] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MalformedAuthHeader
            | AuthError::InvalidToken(_)
            | AuthError::Expired
            | AuthError::MissingClaim
            | AuthError::CredentialMismatch => StatusCode::UNAUTHORIZED,
            AuthError::DuplicateIdentity => StatusCode::CONFLICT,
            AuthError::SigningFailure(_) | AuthError::ExpiryOutOfRange | AuthError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Authentication failure: {:?}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
