use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hometask {
    pub id: String,
    pub course_id: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived on read, never persisted.
    #[sqlx(default)]
    pub is_overdue: bool,
}

impl Hometask {
    /// Recomputes the derived overdue flag against the given clock reading.
    pub fn with_overdue(mut self, now: DateTime<Utc>) -> Self {
        self.is_overdue = self.status == TaskStatus::Pending && self.deadline < now;
        self
    }
}

/// Normalized hometask payload produced by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHometask {
    pub course_id: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
}

/// Partial update; `None` leaves the existing field untouched.
#[derive(Debug, Clone, Default)]
pub struct HometaskUpdate {
    pub course_id: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
}

/// Optional filters for listing hometasks.
#[derive(Debug, Clone, Default)]
pub struct HometaskFilter {
    pub status: Option<TaskStatus>,
    pub course_id: Option<String>,
}
