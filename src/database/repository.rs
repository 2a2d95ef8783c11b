//! Repository traits
//!
//! The persistence seams used by route handlers and the sign-in flow. The
//! server runs on [`DatabaseConnection`](super::DatabaseConnection); tests use
//! an in-memory implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::models::Identity;
use crate::database::models::{Meso, MesoUpdate, NewMeso, User};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error")]
    Database(#[from] anyhow::Error),
}

/// User accounts and credential checks
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Identity whose username matches and whose stored hash accepts `password`
    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Identity>, RepositoryError>;

    /// Create a user with a fresh id; `Conflict("username")` if taken
    async fn create_user(&self, username: &str, password: &str) -> Result<Identity, RepositoryError>;

    async fn read_user(&self, id: Uuid) -> Result<User, RepositoryError>;

    async fn update_user(&self, id: Uuid, username: &str, password: &str) -> Result<(), RepositoryError>;

    /// Delete a user together with every meso they own
    async fn delete_user(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// Training plans, always scoped to their owner
#[async_trait]
pub trait MesoRepository: Send + Sync {
    async fn create_meso(&self, user_id: Uuid, meso: NewMeso) -> Result<Meso, RepositoryError>;

    async fn read_meso(&self, user_id: Uuid, meso_id: Uuid) -> Result<Meso, RepositoryError>;

    /// Up to `count` mesos, most recently updated first
    async fn read_recent_mesos(&self, user_id: Uuid, count: i64) -> Result<Vec<Meso>, RepositoryError>;

    async fn update_meso(
        &self,
        user_id: Uuid,
        meso_id: Uuid,
        update: MesoUpdate,
    ) -> Result<Meso, RepositoryError>;

    async fn delete_meso(&self, user_id: Uuid, meso_id: Uuid) -> Result<(), RepositoryError>;
}
