// Database Connection Management
//
// Handles PostgreSQL connection pooling using tokio-postgres and deadpool, and
// implements the repository traits on top of the pool.
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{error::SqlState, types::Json};
use uuid::Uuid;

use crate::auth::{models::Identity, password};
use crate::database::models::{FromRow, Meso, MesoUpdate, NewMeso, User};
use crate::database::repository::{MesoRepository, RepositoryError, UserRepository};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub pg: tokio_postgres::Config,
    pub max_size: usize,
    pub timeouts: deadpool_postgres::Timeouts,
}

impl DatabaseConfig {
    /// Create configuration from a `postgres://` connection string
    pub fn from_url(url: &str, max_size: usize) -> Result<Self> {
        let pg = tokio_postgres::Config::from_str(url).context("Failed to parse DATABASE_URL")?;

        Ok(Self {
            pg,
            max_size,
            timeouts: deadpool_postgres::Timeouts {
                wait: Some(Duration::from_secs(30)),
                create: Some(Duration::from_secs(30)),
                recycle: Some(Duration::from_secs(30)),
            },
        })
    }

    /// `host:port/dbname` without credentials, for logs
    fn masked(&self) -> String {
        let host = self
            .pg
            .get_hosts()
            .first()
            .map(|h| match h {
                tokio_postgres::config::Host::Tcp(s) => s.clone(),
                tokio_postgres::config::Host::Unix(s) => s.to_string_lossy().to_string(),
            })
            .unwrap_or_default();
        let port = self.pg.get_ports().first().copied().unwrap_or(5432);
        let dbname = self.pg.get_dbname().unwrap_or_default();
        format!("{}:{}/{}", host, port, dbname)
    }
}

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool,
}

impl DatabaseConnection {
    /// Create a new database connection with the provided configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        tracing::info!("🔌 Connecting to database: {}", config.masked());

        let tls_connector = TlsConnector::builder()
            .build()
            .context("Failed to build TLS connector")?;
        let tls = MakeTlsConnector::new(tls_connector);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(config.pg.clone(), tls, mgr_config);

        let pool = Pool::builder(mgr)
            .max_size(config.max_size)
            .wait_timeout(config.timeouts.wait)
            .create_timeout(config.timeouts.create)
            .recycle_timeout(config.timeouts.recycle)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .context("Failed to create database pool")?;

        // Test the connection
        let client = pool
            .get()
            .await
            .context("Failed to get connection from pool")?;

        client
            .query("SELECT 1", &[])
            .await
            .context("Failed to test database connection")?;

        tracing::info!("✅ Database connection established successfully");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn client(&self) -> Result<Object, RepositoryError> {
        Ok(self.pool.get().await.context("Failed to get DB connection")?)
    }
}

fn is_state(err: &tokio_postgres::Error, state: &SqlState) -> bool {
    err.code() == Some(state)
}

#[async_trait]
impl UserRepository for DatabaseConnection {
    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Identity>, RepositoryError> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM users WHERE username = $1", &[&username])
            .await
            .context("Failed to query user by username")?;

        let Some(row) = row else {
            tracing::debug!("No user named {}", username);
            password::verify_password(password, None).await?;
            return Ok(None);
        };
        let user = User::from_row(&row).context("Failed to decode user row")?;

        if password::verify_password(password, Some(&user.password_hash)).await? {
            Ok(Some(user.identity()))
        } else {
            tracing::debug!("Password mismatch for user {}", user.id);
            Ok(None)
        }
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<Identity, RepositoryError> {
        let password_hash = password::hash_password(password).await?;
        let id = Uuid::new_v4();

        let client = self.client().await?;
        match client
            .execute(
                "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)",
                &[&id, &username, &password_hash],
            )
            .await
        {
            Ok(_) => {
                tracing::info!(uuid = %id, operation = "create", "Created new user");
                Ok(Identity {
                    id,
                    username: username.to_string(),
                })
            }
            Err(e) if is_state(&e, &SqlState::UNIQUE_VIOLATION) => Err(RepositoryError::Conflict("username")),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to insert user").into()),
        }
    }

    async fn read_user(&self, id: Uuid) -> Result<User, RepositoryError> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM users WHERE id = $1", &[&id])
            .await
            .context("Failed to query user by id")?
            .ok_or(RepositoryError::NotFound("user"))?;

        Ok(User::from_row(&row).context("Failed to decode user row")?)
    }

    async fn update_user(&self, id: Uuid, username: &str, password: &str) -> Result<(), RepositoryError> {
        let password_hash = password::hash_password(password).await?;

        let client = self.client().await?;
        let updated = match client
            .execute(
                "UPDATE users SET username = $2, password_hash = $3, updated_at = NOW() WHERE id = $1",
                &[&id, &username, &password_hash],
            )
            .await
        {
            Ok(n) => n,
            Err(e) if is_state(&e, &SqlState::UNIQUE_VIOLATION) => {
                return Err(RepositoryError::Conflict("username"));
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to update user").into()),
        };

        if updated == 0 {
            return Err(RepositoryError::NotFound("user"));
        }
        tracing::info!(uuid = %id, operation = "update", "Updated user");
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), RepositoryError> {
        let client = self.client().await?;
        // mesos go with it through ON DELETE CASCADE
        let deleted = client
            .execute("DELETE FROM users WHERE id = $1", &[&id])
            .await
            .context("Failed to delete user")?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound("user"));
        }
        tracing::info!(uuid = %id, operation = "delete", "Deleted user");
        Ok(())
    }
}

#[async_trait]
impl MesoRepository for DatabaseConnection {
    async fn create_meso(&self, user_id: Uuid, meso: NewMeso) -> Result<Meso, RepositoryError> {
        let id = Uuid::new_v4();

        let client = self.client().await?;
        let row = match client
            .query_one(
                "INSERT INTO mesos (id, user_id, name, weeks) VALUES ($1, $2, $3, $4) RETURNING *",
                &[&id, &user_id, &meso.name, &Json(&meso.weeks)],
            )
            .await
        {
            Ok(row) => row,
            Err(e) if is_state(&e, &SqlState::FOREIGN_KEY_VIOLATION) => {
                return Err(RepositoryError::NotFound("user"));
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert meso").into()),
        };

        tracing::info!(uuid = %user_id, meso_uuid = %id, operation = "create", "Created new meso");
        Ok(Meso::from_row(&row).context("Failed to decode meso row")?)
    }

    async fn read_meso(&self, user_id: Uuid, meso_id: Uuid) -> Result<Meso, RepositoryError> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "SELECT * FROM mesos WHERE user_id = $1 AND id = $2",
                &[&user_id, &meso_id],
            )
            .await
            .context("Failed to query meso")?
            .ok_or(RepositoryError::NotFound("meso"))?;

        Ok(Meso::from_row(&row).context("Failed to decode meso row")?)
    }

    async fn read_recent_mesos(&self, user_id: Uuid, count: i64) -> Result<Vec<Meso>, RepositoryError> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT * FROM mesos WHERE user_id = $1 ORDER BY updated_at DESC LIMIT $2",
                &[&user_id, &count],
            )
            .await
            .context("Failed to query recent mesos")?;

        let mesos = rows
            .iter()
            .map(Meso::from_row)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode meso rows")?;
        Ok(mesos)
    }

    async fn update_meso(
        &self,
        user_id: Uuid,
        meso_id: Uuid,
        update: MesoUpdate,
    ) -> Result<Meso, RepositoryError> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "UPDATE mesos \
                 SET name = COALESCE($3, name), weeks = COALESCE($4, weeks), updated_at = NOW() \
                 WHERE user_id = $1 AND id = $2 \
                 RETURNING *",
                &[&user_id, &meso_id, &update.name, &update.weeks.as_ref().map(Json)],
            )
            .await
            .context("Failed to update meso")?
            .ok_or(RepositoryError::NotFound("meso"))?;

        tracing::info!(uuid = %user_id, meso_uuid = %meso_id, operation = "update", "Updated meso");
        Ok(Meso::from_row(&row).context("Failed to decode meso row")?)
    }

    async fn delete_meso(&self, user_id: Uuid, meso_id: Uuid) -> Result<(), RepositoryError> {
        let client = self.client().await?;
        let deleted = client
            .execute(
                "DELETE FROM mesos WHERE user_id = $1 AND id = $2",
                &[&user_id, &meso_id],
            )
            .await
            .context("Failed to delete meso")?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound("meso"));
        }
        tracing::info!(uuid = %user_id, meso_uuid = %meso_id, operation = "delete", "Deleted meso");
        Ok(())
    }
}
