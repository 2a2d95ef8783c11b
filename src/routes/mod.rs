// # Routes Module
//
// HTTP route handlers for the workout server, one submodule per API area.
//
// - `health`: liveness probe
// - `user`: sign-in, sign-up, token refresh and the caller's account
// - `meso`: the caller's training plans
// - `error`: the `{"error": ...}` response type shared by the handlers

pub mod error;

/// Health check endpoint
pub mod health;

/// Training plan endpoints
pub mod meso;

/// Account and token endpoints
pub mod user;
