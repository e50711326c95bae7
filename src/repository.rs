use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Course, CourseUpdate, Hometask, HometaskFilter, HometaskUpdate, NewCourse, NewHometask,
    TaskStatus,
};
use crate::validation;

const COURSE_COLUMNS: &str =
    "id, name, professor, schedule, credits, description, created_at, updated_at";
const HOMETASK_COLUMNS: &str =
    "id, course_id, description, deadline, status, completed_at, created_at, updated_at";

pub async fn insert_course(db: &SqlitePool, new: NewCourse) -> Result<Course, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO courses (id, name, professor, schedule, credits, description, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&new.name)
    .bind(&new.professor)
    .bind(&new.schedule)
    .bind(new.credits)
    .bind(&new.description)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(Course {
        id,
        name: new.name,
        professor: new.professor,
        schedule: new.schedule,
        credits: new.credits,
        description: new.description,
        created_at: now,
        updated_at: now,
    })
}

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, AppError> {
    let courses = sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(courses)
}

pub async fn find_course(db: &SqlitePool, id: &str) -> Result<Option<Course>, AppError> {
    let course = sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(course)
}

/// Merges the partial update into the stored record and re-runs the field
/// validators on the result, so an update cannot bypass creation rules.
pub async fn update_course(
    db: &SqlitePool,
    id: &str,
    update: CourseUpdate,
) -> Result<Course, AppError> {
    let mut current = find_course(db, id).await?.ok_or(AppError::CourseNotFound)?;

    if let Some(name) = update.name {
        current.name = name;
    }
    if let Some(professor) = update.professor {
        current.professor = professor;
    }
    if let Some(schedule) = update.schedule {
        current.schedule = schedule;
    }
    if let Some(credits) = update.credits {
        current.credits = credits;
    }
    if let Some(description) = update.description {
        current.description = description;
    }

    validation::validate_course_record(&current).map_err(AppError::Validation)?;
    current.updated_at = Utc::now();

    sqlx::query(
        "UPDATE courses SET name = ?, professor = ?, schedule = ?, credits = ?, description = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&current.name)
    .bind(&current.professor)
    .bind(&current.schedule)
    .bind(current.credits)
    .bind(&current.description)
    .bind(current.updated_at)
    .bind(id)
    .execute(db)
    .await?;

    Ok(current)
}

/// Removes the course and every hometask referencing it in one transaction,
/// dependents first. Either both deletes commit or neither does.
pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<(), AppError> {
    let mut tx = db.begin().await?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if exists == 0 {
        return Err(AppError::CourseNotFound);
    }

    let cascaded = sqlx::query("DELETE FROM hometasks WHERE course_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if let Err(e) = tx.commit().await {
        tracing::error!(course_id = %id, "course delete cascade failed: {}", e);
        return Err(AppError::Database(e));
    }

    info!(course_id = %id, deleted_hometasks = cascaded, "course deleted");
    Ok(())
}

/// Shape validation has already run; this enforces the referential check
/// against the courses table before persisting. Check and insert share one
/// transaction so a concurrent course delete cannot slip between them.
pub async fn insert_hometask(db: &SqlitePool, new: NewHometask) -> Result<Hometask, AppError> {
    let mut tx = db.begin().await?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses WHERE id = ?")
        .bind(&new.course_id)
        .fetch_one(&mut *tx)
        .await?;
    if exists == 0 {
        return Err(AppError::CourseNotFound);
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO hometasks (id, course_id, description, deadline, status, completed_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, NULL, ?, ?)",
    )
    .bind(&id)
    .bind(&new.course_id)
    .bind(&new.description)
    .bind(new.deadline)
    .bind(TaskStatus::Pending)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Hometask {
        id,
        course_id: new.course_id,
        description: new.description,
        deadline: new.deadline,
        status: TaskStatus::Pending,
        completed_at: None,
        created_at: now,
        updated_at: now,
        is_overdue: false,
    })
}

pub async fn fetch_hometasks(
    db: &SqlitePool,
    filter: HometaskFilter,
) -> Result<Vec<Hometask>, AppError> {
    let tasks = sqlx::query_as::<_, Hometask>(&format!(
        "SELECT {HOMETASK_COLUMNS} FROM hometasks \
         WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR course_id = ?2) \
         ORDER BY deadline ASC"
    ))
    .bind(filter.status)
    .bind(filter.course_id)
    .fetch_all(db)
    .await?;
    Ok(tasks)
}

/// Distinguishes "course missing" (an error) from "course exists, zero
/// tasks" (an empty list).
pub async fn fetch_hometasks_by_course(
    db: &SqlitePool,
    course_id: &str,
) -> Result<Vec<Hometask>, AppError> {
    if find_course(db, course_id).await?.is_none() {
        return Err(AppError::CourseNotFound);
    }
    fetch_hometasks(
        db,
        HometaskFilter {
            course_id: Some(course_id.to_string()),
            ..HometaskFilter::default()
        },
    )
    .await
}

pub async fn find_hometask(db: &SqlitePool, id: &str) -> Result<Option<Hometask>, AppError> {
    let task = sqlx::query_as::<_, Hometask>(&format!(
        "SELECT {HOMETASK_COLUMNS} FROM hometasks WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(task)
}

/// Merge, re-validate, then persist. The `completedAt` derivation lives
/// here and nowhere else: moving into `completed` stamps it, moving out
/// clears it.
pub async fn update_hometask(
    db: &SqlitePool,
    id: &str,
    update: HometaskUpdate,
) -> Result<Hometask, AppError> {
    let mut current = find_hometask(db, id).await?.ok_or(AppError::HometaskNotFound)?;
    let previous_status = current.status;

    if let Some(course_id) = update.course_id {
        if find_course(db, &course_id).await?.is_none() {
            return Err(AppError::CourseNotFound);
        }
        current.course_id = course_id;
    }
    if let Some(description) = update.description {
        current.description = description;
    }
    if let Some(deadline) = update.deadline {
        current.deadline = deadline;
    }
    if let Some(status) = update.status {
        current.status = status;
    }

    validation::validate_hometask_record(&current).map_err(AppError::Validation)?;

    let now = Utc::now();
    match (previous_status, current.status) {
        (TaskStatus::Pending, TaskStatus::Completed) => current.completed_at = Some(now),
        (TaskStatus::Completed, TaskStatus::Pending) => current.completed_at = None,
        _ => {}
    }
    current.updated_at = now;

    sqlx::query(
        "UPDATE hometasks SET course_id = ?, description = ?, deadline = ?, status = ?, completed_at = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&current.course_id)
    .bind(&current.description)
    .bind(current.deadline)
    .bind(current.status)
    .bind(current.completed_at)
    .bind(current.updated_at)
    .bind(id)
    .execute(db)
    .await?;

    Ok(current)
}

/// Named shortcut for the pending → completed transition. Completing an
/// already-completed task is a no-op, `completedAt` included.
pub async fn complete_hometask(db: &SqlitePool, id: &str) -> Result<Hometask, AppError> {
    let mut task = find_hometask(db, id).await?.ok_or(AppError::HometaskNotFound)?;
    if task.status == TaskStatus::Completed {
        return Ok(task);
    }

    let now = Utc::now();
    task.status = TaskStatus::Completed;
    task.completed_at = Some(now);
    task.updated_at = now;

    sqlx::query("UPDATE hometasks SET status = ?, completed_at = ?, updated_at = ? WHERE id = ?")
        .bind(task.status)
        .bind(task.completed_at)
        .bind(task.updated_at)
        .bind(id)
        .execute(db)
        .await?;

    Ok(task)
}

pub async fn delete_hometask(db: &SqlitePool, id: &str) -> Result<(), AppError> {
    let affected = sqlx::query("DELETE FROM hometasks WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(AppError::HometaskNotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn setup_test_db() -> SqlitePool {
        // one connection so the in-memory database is shared
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn sample_course() -> NewCourse {
        NewCourse {
            name: "Algorithms".to_string(),
            professor: "Dr. A".to_string(),
            schedule: "Mon 10-11".to_string(),
            credits: 3,
            description: None,
        }
    }

    fn sample_task(course_id: &str) -> NewHometask {
        NewHometask {
            course_id: course_id.to_string(),
            description: "Finish problem set 1".to_string(),
            deadline: Utc::now() + Duration::days(1),
        }
    }

    #[tokio::test]
    async fn course_roundtrips_through_the_store() {
        let pool = setup_test_db().await;

        let created = insert_course(&pool, sample_course())
            .await
            .expect("Failed to insert course");
        let fetched = find_course(&pool, &created.id)
            .await
            .expect("Failed to fetch course")
            .expect("Course not found");

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Algorithms");
        assert_eq!(fetched.professor, "Dr. A");
        assert_eq!(fetched.credits, 3);
    }

    #[tokio::test]
    async fn partial_update_merges_and_keeps_other_fields() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();

        let updated = update_course(
            &pool,
            &course.id,
            CourseUpdate {
                name: Some("Advanced Algorithms".to_string()),
                ..CourseUpdate::default()
            },
        )
        .await
        .expect("Failed to update course");

        assert_eq!(updated.name, "Advanced Algorithms");
        assert_eq!(updated.professor, "Dr. A");
        assert_eq!(updated.credits, 3);
    }

    #[tokio::test]
    async fn merged_update_cannot_bypass_field_rules() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();

        let result = update_course(
            &pool,
            &course.id,
            CourseUpdate {
                name: Some("Al".to_string()),
                ..CourseUpdate::default()
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        let unchanged = find_course(&pool, &course.id).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "Algorithms");
    }

    #[tokio::test]
    async fn hometask_requires_an_existing_course() {
        let pool = setup_test_db().await;

        let result = insert_hometask(&pool, sample_task(&Uuid::new_v4().to_string())).await;
        assert!(matches!(result, Err(AppError::CourseNotFound)));

        let tasks = fetch_hometasks(&pool, HometaskFilter::default()).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_course_cascades_to_its_hometasks() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();
        for _ in 0..3 {
            insert_hometask(&pool, sample_task(&course.id)).await.unwrap();
        }

        delete_course(&pool, &course.id)
            .await
            .expect("Failed to delete course");

        assert!(find_course(&pool, &course.id).await.unwrap().is_none());
        let survivors = fetch_hometasks(
            &pool,
            HometaskFilter {
                course_id: Some(course.id.clone()),
                ..HometaskFilter::default()
            },
        )
        .await
        .unwrap();
        assert!(survivors.is_empty());

        let listing = fetch_hometasks_by_course(&pool, &course.id).await;
        assert!(matches!(listing, Err(AppError::CourseNotFound)));
    }

    #[tokio::test]
    async fn deleting_a_course_with_no_tasks_is_not_an_error() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();

        delete_course(&pool, &course.id)
            .await
            .expect("Failed to delete course");
        assert!(find_course(&pool, &course.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn completing_twice_is_idempotent() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();
        let task = insert_hometask(&pool, sample_task(&course.id)).await.unwrap();

        let first = complete_hometask(&pool, &task.id).await.unwrap();
        assert_eq!(first.status, TaskStatus::Completed);
        let stamp = first.completed_at.expect("completedAt should be set");

        let second = complete_hometask(&pool, &task.id).await.unwrap();
        assert_eq!(second.status, TaskStatus::Completed);
        assert_eq!(second.completed_at, Some(stamp));
    }

    #[tokio::test]
    async fn moving_out_of_completed_clears_the_stamp() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();
        let task = insert_hometask(&pool, sample_task(&course.id)).await.unwrap();
        complete_hometask(&pool, &task.id).await.unwrap();

        let reopened = update_hometask(
            &pool,
            &task.id,
            HometaskUpdate {
                status: Some(TaskStatus::Pending),
                ..HometaskUpdate::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(reopened.status, TaskStatus::Pending);
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn status_transition_through_update_sets_the_stamp_once() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();
        let task = insert_hometask(&pool, sample_task(&course.id)).await.unwrap();

        let completed = update_hometask(
            &pool,
            &task.id,
            HometaskUpdate {
                status: Some(TaskStatus::Completed),
                ..HometaskUpdate::default()
            },
        )
        .await
        .unwrap();
        let stamp = completed.completed_at.expect("completedAt should be set");

        // already completed, so another completed update keeps the stamp
        let again = update_hometask(
            &pool,
            &task.id,
            HometaskUpdate {
                status: Some(TaskStatus::Completed),
                ..HometaskUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(again.completed_at, Some(stamp));
    }

    #[tokio::test]
    async fn reassigning_a_task_checks_the_target_course() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();
        let task = insert_hometask(&pool, sample_task(&course.id)).await.unwrap();

        let result = update_hometask(
            &pool,
            &task.id,
            HometaskUpdate {
                course_id: Some(Uuid::new_v4().to_string()),
                ..HometaskUpdate::default()
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::CourseNotFound)));
    }

    #[tokio::test]
    async fn status_filter_narrows_the_listing() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, sample_course()).await.unwrap();
        let done = insert_hometask(&pool, sample_task(&course.id)).await.unwrap();
        insert_hometask(&pool, sample_task(&course.id)).await.unwrap();
        complete_hometask(&pool, &done.id).await.unwrap();

        let completed = fetch_hometasks(
            &pool,
            HometaskFilter {
                status: Some(TaskStatus::Completed),
                ..HometaskFilter::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, done.id);

        let pending = fetch_hometasks(
            &pool,
            HometaskFilter {
                status: Some(TaskStatus::Pending),
                ..HometaskFilter::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_missing_hometask_is_not_found() {
        let pool = setup_test_db().await;

        let result = delete_hometask(&pool, &Uuid::new_v4().to_string()).await;
        assert!(matches!(result, Err(AppError::HometaskNotFound)));
    }
}
