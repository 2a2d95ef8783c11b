// Database Models
//
// Tokio-postgres compatible models for users and their training plans.
// A meso's weeks are stored as a single JSONB document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::{types::Json, Row};
use uuid::Uuid;

use crate::auth::models::Identity;

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error>
    where
        Self: Sized;
}

// ============================================================================
// USER MODELS
// ============================================================================

/// User account information
#[derive(Debug, Clone, Serialize)]
pub struct User {
    #[serde(rename = "UUID")]
    pub id: Uuid,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

// ============================================================================
// TRAINING PLAN MODELS
// ============================================================================

/// A mesocycle: a named block of training weeks owned by one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Meso {
    #[serde(rename = "UUID")]
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub weeks: Vec<Week>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Meso {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            weeks: row.try_get::<_, Json<Vec<Week>>>("weeks")?.0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Week {
    pub monday: Day,
    pub tuesday: Day,
    pub wednesday: Day,
    pub thursday: Day,
    pub friday: Day,
    pub saturday: Day,
    pub sunday: Day,
}

impl Week {
    pub fn days(&self) -> [&Day; 7] {
        [
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
            &self.sunday,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Day {
    pub lifts: Vec<Lift>,
}

/// One exercise prescription for a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lift {
    pub exercise: String,
    #[serde(default)]
    pub sets: i32,
    #[serde(default)]
    pub weight: f32,
    #[serde(default)]
    pub reps: i32,
    #[serde(default)]
    pub pump: i32,
    #[serde(default)]
    pub soreness: i32,
}

/// True when every lift in every day of `weeks` names an exercise
pub fn exercises_named(weeks: &[Week]) -> bool {
    weeks
        .iter()
        .flat_map(|week| week.days())
        .flat_map(|day| day.lifts.iter())
        .all(|lift| !lift.exercise.trim().is_empty())
}

/// Validated input for a new meso
#[derive(Debug, Clone)]
pub struct NewMeso {
    pub name: String,
    pub weeks: Vec<Week>,
}

/// Fields to overwrite on an existing meso; `None` leaves the stored value
#[derive(Debug, Clone, Default)]
pub struct MesoUpdate {
    pub name: Option<String>,
    pub weeks: Option<Vec<Week>>,
}
