use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Course, CourseUpdate, Hometask, HometaskUpdate, NewCourse, NewHometask, TaskStatus};

/// Per-field error messages, keyed by the JSON field name.
pub type ValidationErrors = BTreeMap<&'static str, String>;

pub const COURSE_NAME_MIN: usize = 3;
pub const COURSE_NAME_MAX: usize = 100;
pub const PROFESSOR_MAX: usize = 100;
pub const SCHEDULE_MAX: usize = 100;
pub const COURSE_DESCRIPTION_MAX: usize = 500;
pub const TASK_DESCRIPTION_MIN: usize = 5;
pub const TASK_DESCRIPTION_MAX: usize = 100;

/// IDs are generated as UUID v4 strings; a path or reference parameter
/// that does not parse as one is malformed, which is a different failure
/// than a missing record.
pub fn is_valid_id(id: &str) -> bool {
    Uuid::try_parse(id).is_ok()
}

fn check_course_name(v: &str) -> Option<String> {
    let len = v.chars().count();
    if !(COURSE_NAME_MIN..=COURSE_NAME_MAX).contains(&len) {
        return Some(format!(
            "Course name must be between {COURSE_NAME_MIN} and {COURSE_NAME_MAX} characters"
        ));
    }
    None
}

fn check_professor(v: &str) -> Option<String> {
    if v.chars().count() > PROFESSOR_MAX {
        return Some(format!("Professor's name cannot exceed {PROFESSOR_MAX} characters"));
    }
    None
}

fn check_schedule(v: &str) -> Option<String> {
    if v.chars().count() > SCHEDULE_MAX {
        return Some(format!("Schedule cannot exceed {SCHEDULE_MAX} characters"));
    }
    None
}

fn check_credits(v: i64) -> Option<String> {
    if v < 1 {
        return Some("Credits must be at least 1".to_string());
    }
    None
}

fn check_course_description(v: &str) -> Option<String> {
    if v.chars().count() > COURSE_DESCRIPTION_MAX {
        return Some(format!(
            "Description cannot exceed {COURSE_DESCRIPTION_MAX} characters"
        ));
    }
    None
}

fn check_task_description(v: &str) -> Option<String> {
    let len = v.chars().count();
    if !(TASK_DESCRIPTION_MIN..=TASK_DESCRIPTION_MAX).contains(&len) {
        return Some(format!(
            "Description must be between {TASK_DESCRIPTION_MIN} and {TASK_DESCRIPTION_MAX} characters"
        ));
    }
    None
}

/// Present, string-typed and non-empty after trimming.
fn string_field(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

pub fn validate_new_course(body: &Value) -> Result<NewCourse, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = string_field(body, "name");
    match &name {
        Some(v) => {
            if let Some(msg) = check_course_name(v) {
                errors.insert("name", msg);
            }
        }
        None => {
            errors.insert("name", "Course name is required and must be a string".to_string());
        }
    }

    let professor = string_field(body, "professor");
    match &professor {
        Some(v) => {
            if let Some(msg) = check_professor(v) {
                errors.insert("professor", msg);
            }
        }
        None => {
            errors.insert(
                "professor",
                "Professor name is required and must be a string".to_string(),
            );
        }
    }

    let schedule = string_field(body, "schedule");
    match &schedule {
        Some(v) => {
            if let Some(msg) = check_schedule(v) {
                errors.insert("schedule", msg);
            }
        }
        None => {
            errors.insert("schedule", "Schedule is required".to_string());
        }
    }

    let credits = body.get("credits").and_then(Value::as_i64);
    match credits {
        Some(v) => {
            if let Some(msg) = check_credits(v) {
                errors.insert("credits", msg);
            }
        }
        None => {
            errors.insert("credits", "Credits must be an integer of at least 1".to_string());
        }
    }

    let description = match body.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                if let Some(msg) = check_course_description(trimmed) {
                    errors.insert("description", msg);
                }
                Some(trimmed.to_string())
            }
        }
        Some(_) => {
            errors.insert("description", "Description must be a string".to_string());
            None
        }
    };

    match (name, professor, schedule, credits) {
        (Some(name), Some(professor), Some(schedule), Some(credits)) if errors.is_empty() => {
            Ok(NewCourse {
                name,
                professor,
                schedule,
                credits,
                description,
            })
        }
        _ => Err(errors),
    }
}

/// Parses only the fields present in a partial update; bounds on the merged
/// record are re-checked by [`validate_course_record`] in the store.
pub fn validate_course_update(body: &Value) -> Result<CourseUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut update = CourseUpdate::default();

    if let Some(v) = body.get("name") {
        match v.as_str() {
            Some(s) => update.name = Some(s.trim().to_string()),
            None => {
                errors.insert("name", "Course name must be a string".to_string());
            }
        }
    }
    if let Some(v) = body.get("professor") {
        match v.as_str() {
            Some(s) => update.professor = Some(s.trim().to_string()),
            None => {
                errors.insert("professor", "Professor name must be a string".to_string());
            }
        }
    }
    if let Some(v) = body.get("schedule") {
        match v.as_str() {
            Some(s) => update.schedule = Some(s.trim().to_string()),
            None => {
                errors.insert("schedule", "Schedule must be a string".to_string());
            }
        }
    }
    if let Some(v) = body.get("credits") {
        match v.as_i64() {
            Some(c) => update.credits = Some(c),
            None => {
                errors.insert("credits", "Credits must be an integer".to_string());
            }
        }
    }
    if let Some(v) = body.get("description") {
        match v {
            // null or empty clears the description, same normalization as creation
            Value::Null => update.description = Some(None),
            Value::String(s) => {
                let trimmed = s.trim();
                update.description = if trimmed.is_empty() {
                    Some(None)
                } else {
                    Some(Some(trimmed.to_string()))
                };
            }
            _ => {
                errors.insert("description", "Description must be a string".to_string());
            }
        }
    }

    if errors.is_empty() { Ok(update) } else { Err(errors) }
}

/// Field rules re-run against a merged record, so a partial update cannot
/// bypass the constraints enforced at creation.
pub fn validate_course_record(course: &Course) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if course.name.trim().is_empty() {
        errors.insert("name", "Course name is required and must be a string".to_string());
    } else if let Some(msg) = check_course_name(course.name.trim()) {
        errors.insert("name", msg);
    }
    if course.professor.trim().is_empty() {
        errors.insert(
            "professor",
            "Professor name is required and must be a string".to_string(),
        );
    } else if let Some(msg) = check_professor(course.professor.trim()) {
        errors.insert("professor", msg);
    }
    if course.schedule.trim().is_empty() {
        errors.insert("schedule", "Schedule is required".to_string());
    } else if let Some(msg) = check_schedule(course.schedule.trim()) {
        errors.insert("schedule", msg);
    }
    if let Some(msg) = check_credits(course.credits) {
        errors.insert("credits", msg);
    }
    if let Some(description) = &course.description {
        if let Some(msg) = check_course_description(description) {
            errors.insert("description", msg);
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// `now` is passed in rather than read from the clock so the function stays
/// pure; the deadline must be strictly after it.
pub fn validate_new_hometask(body: &Value, now: DateTime<Utc>) -> Result<NewHometask, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let course_id = match body.get("courseId").and_then(Value::as_str) {
        Some(s) if is_valid_id(s) => Some(s.to_string()),
        _ => {
            errors.insert("courseId", "Valid course ID is required".to_string());
            None
        }
    };

    let description = string_field(body, "description");
    match &description {
        Some(v) => {
            if let Some(msg) = check_task_description(v) {
                errors.insert("description", msg);
            }
        }
        None => {
            errors.insert(
                "description",
                "Description is required and must be a string".to_string(),
            );
        }
    }

    let deadline = match body.get("deadline").and_then(Value::as_str).and_then(parse_deadline) {
        Some(d) => {
            if d <= now {
                errors.insert("deadline", "Deadline must be in the future".to_string());
            }
            Some(d)
        }
        None => {
            errors.insert("deadline", "Valid deadline date is required".to_string());
            None
        }
    };

    match (course_id, description, deadline) {
        (Some(course_id), Some(description), Some(deadline)) if errors.is_empty() => {
            Ok(NewHometask {
                course_id,
                description,
                deadline,
            })
        }
        _ => Err(errors),
    }
}

/// A deadline supplied in an update must be in the future again; a merged
/// record keeping its old deadline is not re-checked, so tasks can age into
/// overdue naturally.
pub fn validate_hometask_update(
    body: &Value,
    now: DateTime<Utc>,
) -> Result<HometaskUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut update = HometaskUpdate::default();

    if let Some(v) = body.get("courseId") {
        match v.as_str() {
            Some(s) if is_valid_id(s) => update.course_id = Some(s.to_string()),
            _ => {
                errors.insert("courseId", "Valid course ID is required".to_string());
            }
        }
    }
    if let Some(v) = body.get("description") {
        match v.as_str() {
            Some(s) => update.description = Some(s.trim().to_string()),
            None => {
                errors.insert("description", "Description must be a string".to_string());
            }
        }
    }
    if let Some(v) = body.get("deadline") {
        match v.as_str().and_then(parse_deadline) {
            Some(d) if d > now => update.deadline = Some(d),
            Some(_) => {
                errors.insert("deadline", "Deadline must be in the future".to_string());
            }
            None => {
                errors.insert("deadline", "Valid deadline date is required".to_string());
            }
        }
    }
    if let Some(v) = body.get("status") {
        match v.as_str().and_then(TaskStatus::parse) {
            Some(s) => update.status = Some(s),
            None => {
                errors.insert(
                    "status",
                    "Status must be either 'pending' or 'completed'".to_string(),
                );
            }
        }
    }

    if errors.is_empty() { Ok(update) } else { Err(errors) }
}

pub fn validate_hometask_record(task: &Hometask) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !is_valid_id(&task.course_id) {
        errors.insert("courseId", "Valid course ID is required".to_string());
    }
    if task.description.trim().is_empty() {
        errors.insert(
            "description",
            "Description is required and must be a string".to_string(),
        );
    } else if let Some(msg) = check_task_description(task.description.trim()) {
        errors.insert("description", msg);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
