//! Pure aggregation over in-memory courses and tasks. Stateless by design:
//! "now" shifts the overdue partition, so callers evaluate fresh on every
//! dashboard read.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{
    Course, Dashboard, DashboardStats, Hometask, HometaskWithCourse, TaskStatus,
};

pub const RECENT_COURSES_LIMIT: usize = 3;
pub const UPCOMING_LIMIT: usize = 5;
pub const RECENTLY_COMPLETED_LIMIT: usize = 5;

#[derive(Debug, Default)]
pub struct TaskBuckets {
    pub overdue: Vec<Hometask>,
    pub upcoming: Vec<Hometask>,
    pub completed: Vec<Hometask>,
}

/// Splits tasks into overdue / upcoming / completed relative to `now`.
/// A pending task is in exactly one of the first two buckets.
pub fn partition_tasks(tasks: Vec<Hometask>, now: DateTime<Utc>) -> TaskBuckets {
    let mut buckets = TaskBuckets::default();
    for task in tasks {
        let task = task.with_overdue(now);
        match task.status {
            TaskStatus::Completed => buckets.completed.push(task),
            TaskStatus::Pending if task.deadline < now => buckets.overdue.push(task),
            TaskStatus::Pending => buckets.upcoming.push(task),
        }
    }
    buckets
}

pub fn build_dashboard(
    courses: Vec<Course>,
    tasks: Vec<Hometask>,
    now: DateTime<Utc>,
) -> Dashboard {
    let stats = DashboardStats {
        total_courses: courses.len(),
        total_hometasks: tasks.len(),
        completed_hometasks: tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count(),
        pending_hometasks: tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count(),
    };

    let names: HashMap<String, String> = courses
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect();

    let mut buckets = partition_tasks(tasks, now);
    buckets.overdue.sort_by_key(|t| t.deadline);
    buckets.upcoming.sort_by_key(|t| t.deadline);
    buckets.upcoming.truncate(UPCOMING_LIMIT);
    buckets.completed.sort_by_key(|t| Reverse(completion_time(t)));
    buckets.completed.truncate(RECENTLY_COMPLETED_LIMIT);

    let mut recent_courses = courses;
    recent_courses.sort_by_key(|c| Reverse(c.created_at));
    recent_courses.truncate(RECENT_COURSES_LIMIT);

    Dashboard {
        stats,
        recent_courses,
        upcoming_hometasks: with_course_names(buckets.upcoming, &names),
        recently_completed: with_course_names(buckets.completed, &names),
        overdue_hometasks: with_course_names(buckets.overdue, &names),
    }
}

/// Sort key for "recently completed": `completedAt`, falling back to
/// `updatedAt` when the stamp is missing.
fn completion_time(task: &Hometask) -> DateTime<Utc> {
    task.completed_at.unwrap_or(task.updated_at)
}

fn with_course_names(
    tasks: Vec<Hometask>,
    names: &HashMap<String, String>,
) -> Vec<HometaskWithCourse> {
    tasks
        .into_iter()
        .map(|hometask| {
            let course_name = names.get(&hometask.course_id).cloned();
            HometaskWithCourse {
                hometask,
                course_name,
            }
        })
        .collect()
}
