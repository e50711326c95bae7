use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub professor: String,
    pub schedule: String,
    pub credits: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized course payload produced by validation; the store assigns
/// `id` and timestamps on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub professor: String,
    pub schedule: String,
    pub credits: i64,
    pub description: Option<String>,
}

/// Partial update; `None` leaves the existing field untouched.
#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub name: Option<String>,
    pub professor: Option<String>,
    pub schedule: Option<String>,
    pub credits: Option<i64>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}
