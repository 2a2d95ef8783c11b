//! # Server Module
//!
//! HTTP server setup and route configuration for the workout server.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenCodec;
use crate::config::Config;
use crate::database::{migrations, DatabaseConnection, MesoRepository, UserRepository};
use crate::routes::{health::ping, meso, user};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub users: Arc<dyn UserRepository>,
    pub mesos: Arc<dyn MesoRepository>,
}

/// Build the full router: public health probe, user routes and meso routes,
/// with CORS and request tracing around everything.
pub fn create_app(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Router::new()
        .route("/ping", get(ping))
        .merge(user::create_user_routes(state.codec.clone()))
        .merge(meso::create_meso_routes(state.codec.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(AllowOrigin::list(origins))
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers([
                            header::ORIGIN,
                            header::CONTENT_TYPE,
                            header::ACCEPT,
                            header::AUTHORIZATION,
                        ]),
                ),
        )
        .with_state(state)
}

/// Connects to the database, applies migrations and serves HTTP until the
/// process is stopped.
pub async fn start(config: Config) -> Result<()> {
    let codec = Arc::new(
        TokenCodec::new(&config.jwt_secret)
            .with_lifetimes(config.tokens.access_ttl, config.tokens.refresh_ttl),
    );

    let db = Arc::new(DatabaseConnection::new(config.database.clone()).await?);
    migrations::run_migrations(db.pool()).await?;

    let state = AppState {
        codec,
        users: db.clone(),
        mesos: db,
    };
    let app = create_app(state, &config.server.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;

    tracing::info!("🚀 Workout server listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("👤 User endpoints available at http://{}/client-services/user", addr);
    tracing::info!("🏋️  Meso endpoints available at http://{}/client-services/meso", addr);

    axum::serve(listener, app).await.context("Server stopped unexpectedly")?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::database::memory::InMemoryRepository;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    pub const SECRET: &str = "test_secret";

    /// Full router over an in-memory repository
    pub fn test_app() -> (Router, Arc<TokenCodec>, Arc<InMemoryRepository>) {
        let codec = Arc::new(TokenCodec::new(SECRET));
        let repo = Arc::new(InMemoryRepository::new());
        let state = AppState {
            codec: codec.clone(),
            users: repo.clone(),
            mesos: repo.clone(),
        };
        (create_app(state, &[]), codec, repo)
    }

    /// Send one request and decode the JSON response body
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Sign up `username` and return its access token
    pub async fn signed_up(app: &Router, username: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/client-services/user",
            None,
            Some(serde_json::json!({ "username": username, "password": "secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }
}
