//! JWT Token Service
//!
//! Issues and verifies the HS256 bearer tokens handed out at sign-in/sign-up.
//! Tokens are stateless: nothing is stored server side and a token stays valid
//! until its `exp` passes.
//!
//! Expiry is never left to the decoder. Both validations below disable the
//! library's own `exp` check and the codec compares `exp` against its [`Clock`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{Identity, TokenPair},
};

pub const DEFAULT_ACCESS_TTL_HOURS: i64 = 72;
pub const DEFAULT_REFRESH_TTL_HOURS: i64 = 30 * 24;

/// Header algorithms accepted on decode. Anything else, including `none` and
/// every asymmetric scheme, is rejected before the signature is looked at.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Source of the current instant for issuing and expiring tokens
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What a token may be used for
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Authorizes requests on protected routes
    #[default]
    Access,
    /// Only exchangeable for a new token pair
    Refresh,
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username at issue time
    #[serde(default)]
    pub name: String,
    /// Subject id
    #[serde(default)]
    pub uuid: String,
    /// Expiration timestamp (seconds)
    pub exp: i64,
    #[serde(default)]
    pub kind: TokenKind,
}

/// Stateless token issuer/verifier bound to one shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Signature and header algorithm only
    signature_validation: Validation,
    /// Signature, header algorithm and presence of `exp`
    claims_validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec for `secret` with the default lifetimes and the system clock
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            signature_validation: hmac_validation(&[]),
            claims_validation: hmac_validation(&["exp"]),
            access_ttl: Duration::hours(DEFAULT_ACCESS_TTL_HOURS),
            refresh_ttl: Duration::hours(DEFAULT_REFRESH_TTL_HOURS),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Generate an access token for `identity`
    pub fn issue_access(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue(identity, TokenKind::Access, self.access_ttl)
    }

    /// Generate a refresh token for `identity`
    pub fn issue_refresh(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue(identity, TokenKind::Refresh, self.refresh_ttl)
    }

    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            token: self.issue_access(identity)?,
            refresh_token: self.issue_refresh(identity)?,
        })
    }

    fn issue(&self, identity: &Identity, kind: TokenKind, ttl: Duration) -> Result<String, AuthError> {
        let exp = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or(AuthError::ExpiryOutOfRange)?;

        let claims = Claims {
            name: identity.username.clone(),
            uuid: identity.id.to_string(),
            exp: exp.timestamp(),
            kind,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::SigningFailure)
    }

    /// Check encoding, signature and header algorithm. Claims are not inspected.
    pub fn verify(&self, token: &str) -> Result<(), AuthError> {
        decode::<serde_json::Value>(token, &self.decoding_key, &self.signature_validation)
            .map(|_| ())
            .map_err(rejected)
    }

    /// Fully validate an access token and return its subject id
    pub fn extract_subject(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.decode_claims(token)?;
        if claims.kind != TokenKind::Access {
            return Err(AuthError::InvalidToken(
                "refresh token cannot authorize requests".to_string(),
            ));
        }

        parse_subject(&claims.uuid)
    }

    /// Fully validate a refresh token and return the identity it was issued to
    pub fn redeem_refresh(&self, refresh_token: &str) -> Result<Identity, AuthError> {
        let claims = self.decode_claims(refresh_token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::InvalidToken("expected a refresh token".to_string()));
        }

        Ok(Identity {
            id: parse_subject(&claims.uuid)?,
            username: claims.name,
        })
    }

    /// Validate signature and algorithm, then enforce `exp` against the clock
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.claims_validation)
            .map_err(rejected)?
            .claims;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

fn hmac_validation(required_claims: &[&str]) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = HMAC_ALGORITHMS.to_vec();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(required_claims);
    validation
}

fn rejected(err: jsonwebtoken::errors::Error) -> AuthError {
    tracing::debug!("Token rejected: {:?}", err);
    AuthError::InvalidToken(err.to_string())
}

fn parse_subject(subject: &str) -> Result<Uuid, AuthError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(AuthError::MissingClaim);
    }

    Uuid::parse_str(subject)
        .map_err(|_| AuthError::InvalidToken("subject is not a valid uuid".to_string()))
}

/// Clock that only moves when told to
#[cfg(test)]
pub struct ManualClock(parking_lot::Mutex<DateTime<Utc>>);

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(parking_lot::Mutex::new(start))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}
