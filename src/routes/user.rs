//! User routes: sign-in, sign-up, token refresh and account management
//!
//! Sign-in, sign-up and refresh are public. Reading, updating and deleting the
//! account all go through the auth middleware and act on the caller only.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::{
    flow,
    models::{Credentials, RefreshRequest, SignUpResponse, TokenPair},
    AuthMiddleware, AuthUser, TokenCodec,
};
use crate::database::models::User;
use crate::routes::error::ApiError;
use crate::server::AppState;

fn validated(payload: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, ApiError> {
    let credentials = payload?.0.trimmed();
    let missing = credentials.missing_keys();
    if !missing.is_empty() {
        return Err(ApiError::missing_keys(&missing));
    }
    Ok(credentials)
}

pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let credentials = validated(payload)?;
    let tokens = flow::sign_in(state.users.as_ref(), &state.codec, &credentials).await?;
    Ok(Json(tokens))
}

pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SignUpResponse>, ApiError> {
    let credentials = validated(payload)?;
    let tokens = flow::sign_up(state.users.as_ref(), &state.codec, &credentials).await?;
    Ok(Json(SignUpResponse::new(tokens)))
}

pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(request) = payload?;
    if request.refresh_token.trim().is_empty() {
        return Err(ApiError::missing_keys(&["refresh_token"]));
    }

    let tokens = flow::refresh(state.users.as_ref(), &state.codec, request.refresh_token.trim()).await?;
    Ok(Json(tokens))
}

pub async fn read_user(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, ApiError> {
    let found = state.users.read_user(user.id).await?;
    Ok(Json(found))
}

pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let update = validated(payload)?;
    state
        .users
        .update_user(user.id, &update.username, &update.password)
        .await?;

    tracing::info!(uuid = %user.id, "Successfully updated user");
    Ok(Json(json!({ "msg": "updated client" })))
}

pub async fn delete_user(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>, ApiError> {
    state.users.delete_user(user.id).await?;

    Ok(Json(json!({
        "message": format!("successfully deleted user: {}", user.id)
    })))
}

pub fn create_user_routes(codec: Arc<TokenCodec>) -> Router<AppState> {
    let gate = middleware::from_fn_with_state(codec, AuthMiddleware::validate_token);

    let account = axum::routing::get(read_user)
        .put(update_user)
        .delete(delete_user)
        .route_layer(gate);

    Router::new()
        .route("/client-services/user/signin", post(sign_in))
        .route("/client-services/user/refresh", post(refresh))
        .route("/client-services/user", post(sign_up).merge(account))
}
