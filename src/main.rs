//! # Workout Server
//!
//! HTTP API for lifters: account sign-up and sign-in with JWT bearer tokens,
//! plus storage of mesocycles (multi-week training plans) per user.
//!
//! ## Architecture
//! - `server`: router assembly and startup
//! - `config`: environment variable configuration
//! - `auth`: token codec, middleware, password hashing and sign-in flow
//! - `database`: PostgreSQL pool, migrations and repositories
//! - `routes`: HTTP handlers
//!
//! ## Running the Server
//! ```bash
//! JWT_SECRET=... DATABASE_URL=postgres://... cargo run
//! ```
//!
//! The server listens on `0.0.0.0:3000` unless `SERVER_HOST` / `PORT` say otherwise.

mod auth;
mod config;
mod database;
mod routes;
mod server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting workout server...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::start(config).await {
        tracing::error!("❌ Server error: {:#}", e);
        std::process::exit(1);
    }
}
