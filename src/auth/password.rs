//! Password hashing with Argon2id. Only PHC strings are ever stored.
//!
//! Hashing and verification are CPU bound and run on tokio's blocking pool.

use anyhow::{anyhow, Context, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

/// Hash checked when no account matches, so an unknown username costs the
/// same as a wrong password. Same parameters as every stored hash.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password_sync("workout-server-dummy-password").ok());

#[cfg(test)]
pub static VERIFICATIONS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// Hash `password` with a fresh random salt
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password_sync(&password))
        .await
        .context("Password hashing task failed")?
}

/// Check `password` against a stored PHC string.
///
/// With no stored hash the dummy hash is checked instead and the result is
/// always `Ok(false)`. An unparseable stored hash is an error; a plain
/// mismatch is `Ok(false)`.
pub async fn verify_password(password: &str, stored_hash: Option<&str>) -> Result<bool> {
    let password = password.to_string();
    let stored = stored_hash.map(str::to_string);

    tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify_password_sync(&password, &stored),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password_sync(&password, dummy);
            }
            Ok(false)
        }
    })
    .await
    .context("Password verification task failed")?
}

fn hash_password_sync(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

fn verify_password_sync(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow!("Stored password hash is corrupt: {}", e))?;

    #[cfg(test)]
    VERIFICATIONS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
