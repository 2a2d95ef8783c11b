use axum::response::Json;
use serde_json::json;

/// Liveness probe.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
///
/// Public, never touches the database. Always answers `{"status": "pong"}`
/// so load balancers and container probes can check the process is up.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}
