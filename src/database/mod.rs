//! # Database Module
//!
//! PostgreSQL persistence using tokio-postgres with a deadpool connection pool.
//! Includes connection management, models, migrations and the repository traits
//! the HTTP layer is written against.

pub mod connection;
#[cfg(test)]
pub mod memory;
pub mod migrations;
pub mod models;
pub mod repository;

pub use connection::{DatabaseConfig, DatabaseConnection};
pub use repository::{MesoRepository, RepositoryError, UserRepository};
