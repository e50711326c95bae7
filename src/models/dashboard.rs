use serde::Serialize;

use crate::models::{Course, Hometask};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_courses: usize,
    pub total_hometasks: usize,
    pub completed_hometasks: usize,
    pub pending_hometasks: usize,
}

/// A task joined with its owning course's name for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HometaskWithCourse {
    #[serde(flatten)]
    pub hometask: Hometask,
    pub course_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_courses: Vec<Course>,
    pub upcoming_hometasks: Vec<HometaskWithCourse>,
    pub recently_completed: Vec<HometaskWithCourse>,
    pub overdue_hometasks: Vec<HometaskWithCourse>,
}
