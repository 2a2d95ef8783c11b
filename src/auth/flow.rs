//! Sign-in, sign-up and refresh
//!
//! Glue between the user repository and the token codec. None of these run
//! behind the auth middleware.

use crate::auth::{
    error::AuthError,
    jwt::TokenCodec,
    models::{Credentials, TokenPair},
};
use crate::database::repository::{RepositoryError, UserRepository};

fn store_error(err: RepositoryError) -> AuthError {
    AuthError::Store(anyhow::Error::new(err))
}

/// Issue tokens for a matching username/password pair.
///
/// Unknown usernames and wrong passwords fail identically.
pub async fn sign_in(
    users: &dyn UserRepository,
    codec: &TokenCodec,
    credentials: &Credentials,
) -> Result<TokenPair, AuthError> {
    let identity = users
        .find_user_by_credentials(&credentials.username, &credentials.password)
        .await
        .map_err(store_error)?
        .ok_or_else(|| {
            tracing::info!("Sign-in rejected for {}", credentials.username);
            AuthError::CredentialMismatch
        })?;

    tracing::info!(uuid = %identity.id, "User signed in");
    codec.issue_pair(&identity)
}

/// Register a new user and issue their first tokens
pub async fn sign_up(
    users: &dyn UserRepository,
    codec: &TokenCodec,
    credentials: &Credentials,
) -> Result<TokenPair, AuthError> {
    let identity = match users
        .create_user(&credentials.username, &credentials.password)
        .await
    {
        Ok(identity) => identity,
        Err(RepositoryError::Conflict(_)) => {
            tracing::info!("Sign-up rejected, {} is taken", credentials.username);
            return Err(AuthError::DuplicateIdentity);
        }
        Err(e) => return Err(store_error(e)),
    };

    codec.issue_pair(&identity)
}

/// Trade a refresh token for a new pair, provided the account still exists
pub async fn refresh(
    users: &dyn UserRepository,
    codec: &TokenCodec,
    refresh_token: &str,
) -> Result<TokenPair, AuthError> {
    let redeemed = codec.redeem_refresh(refresh_token)?;

    let user = match users.read_user(redeemed.id).await {
        Ok(user) => user,
        Err(RepositoryError::NotFound(_)) => {
            return Err(AuthError::InvalidToken("unknown subject".to_string()));
        }
        Err(e) => return Err(store_error(e)),
    };

    codec.issue_pair(&user.identity())
}
