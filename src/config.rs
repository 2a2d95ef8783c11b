//! Configuration module for environment variables and application settings

use std::env;

use anyhow::{anyhow, Context, Result};
use chrono::Duration;

use crate::auth::jwt::{DEFAULT_ACCESS_TTL_HOURS, DEFAULT_REFRESH_TTL_HOURS};
use crate::database::DatabaseConfig;

/// Ten years
pub const MAX_TOKEN_TTL_HOURS: i64 = 10 * 365 * 24;

/// Application configuration loaded from environment variables once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared HMAC secret for signing and verifying tokens
    pub jwt_secret: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Token lifetimes
    pub tokens: TokenConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct TokenConfig {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET environment variable is required"))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 16)?;

        let access_ttl = token_ttl(&lookup, "ACCESS_TOKEN_TTL_HOURS", DEFAULT_ACCESS_TTL_HOURS)?;
        let refresh_ttl = token_ttl(&lookup, "REFRESH_TOKEN_TTL_HOURS", DEFAULT_REFRESH_TTL_HOURS)?;

        Ok(Self {
            jwt_secret,

            database: DatabaseConfig::from_url(&database_url, max_connections)?,

            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 3000)?,
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| "http://localhost:3001".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },

            tokens: TokenConfig {
                access_ttl,
                refresh_ttl,
            },
        })
    }
}

/// Token lifetime in hours, between 1 and [`MAX_TOKEN_TTL_HOURS`]
fn token_ttl(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: i64) -> Result<Duration> {
    let hours: i64 = parse_or(lookup, key, default)?;
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        return Err(anyhow!(
            "{} must be between 1 and {} hours, got {}",
            key,
            MAX_TOKEN_TTL_HOURS,
            hours
        ));
    }

    Duration::try_hours(hours).ok_or_else(|| anyhow!("{} is out of range: {}", key, hours))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
