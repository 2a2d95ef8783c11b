//! # Authentication Module
//!
//! Handles JWT token issuance, validation, and middleware for securing API endpoints,
//! plus the sign-in/sign-up flow and password hashing behind it.

pub mod error;
pub mod flow;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use error::AuthError;
pub use jwt::TokenCodec;
pub use middleware::AuthMiddleware;
pub use models::AuthUser;
