//! In-memory repository used by the handler and middleware tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::auth::{models::Identity, password};
use crate::database::models::{Meso, MesoUpdate, NewMeso, User};
use crate::database::repository::{MesoRepository, RepositoryError, UserRepository};

#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<Uuid, User>>,
    /// Least recently touched first
    mesos: RwLock<Vec<Meso>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Identity>, RepositoryError> {
        let user = self
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned();

        let stored = user.as_ref().map(|u| u.password_hash.as_str());
        if password::verify_password(password, stored).await? {
            Ok(user.map(|u| u.identity()))
        } else {
            Ok(None)
        }
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<Identity, RepositoryError> {
        let password_hash = password::hash_password(password).await?;

        let mut users = self.users.write();
        if users.values().any(|u| u.username == username) {
            return Err(RepositoryError::Conflict("username"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            created_at: now,
            updated_at: now,
        };
        let identity = user.identity();
        users.insert(user.id, user);
        Ok(identity)
    }

    async fn read_user(&self, id: Uuid) -> Result<User, RepositoryError> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound("user"))
    }

    async fn update_user(&self, id: Uuid, username: &str, password: &str) -> Result<(), RepositoryError> {
        let password_hash = password::hash_password(password).await?;

        let mut users = self.users.write();
        if users.values().any(|u| u.username == username && u.id != id) {
            return Err(RepositoryError::Conflict("username"));
        }
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound("user"))?;
        user.username = username.to_string();
        user.password_hash = password_hash;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.users
            .write()
            .remove(&id)
            .ok_or(RepositoryError::NotFound("user"))?;
        self.mesos.write().retain(|m| m.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl MesoRepository for InMemoryRepository {
    async fn create_meso(&self, user_id: Uuid, meso: NewMeso) -> Result<Meso, RepositoryError> {
        if !self.users.read().contains_key(&user_id) {
            return Err(RepositoryError::NotFound("user"));
        }

        let now = Utc::now();
        let meso = Meso {
            id: Uuid::new_v4(),
            user_id,
            name: meso.name,
            weeks: meso.weeks,
            created_at: now,
            updated_at: now,
        };
        self.mesos.write().push(meso.clone());
        Ok(meso)
    }

    async fn read_meso(&self, user_id: Uuid, meso_id: Uuid) -> Result<Meso, RepositoryError> {
        self.mesos
            .read()
            .iter()
            .find(|m| m.user_id == user_id && m.id == meso_id)
            .cloned()
            .ok_or(RepositoryError::NotFound("meso"))
    }

    async fn read_recent_mesos(&self, user_id: Uuid, count: i64) -> Result<Vec<Meso>, RepositoryError> {
        let limit = usize::try_from(count).unwrap_or(0);
        Ok(self
            .mesos
            .read()
            .iter()
            .rev()
            .filter(|m| m.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_meso(
        &self,
        user_id: Uuid,
        meso_id: Uuid,
        update: MesoUpdate,
    ) -> Result<Meso, RepositoryError> {
        let mut mesos = self.mesos.write();
        let position = mesos
            .iter()
            .position(|m| m.user_id == user_id && m.id == meso_id)
            .ok_or(RepositoryError::NotFound("meso"))?;

        let mut meso = mesos.remove(position);
        if let Some(name) = update.name {
            meso.name = name;
        }
        if let Some(weeks) = update.weeks {
            meso.weeks = weeks;
        }
        meso.updated_at = Utc::now();
        mesos.push(meso.clone());
        Ok(meso)
    }

    async fn delete_meso(&self, user_id: Uuid, meso_id: Uuid) -> Result<(), RepositoryError> {
        let mut mesos = self.mesos.write();
        let before = mesos.len();
        mesos.retain(|m| !(m.user_id == user_id && m.id == meso_id));
        if mesos.len() == before {
            return Err(RepositoryError::NotFound("meso"));
        }
        Ok(())
    }
}
