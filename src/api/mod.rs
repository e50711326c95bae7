use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::{HometaskFilter, TaskStatus};
use crate::repository;
use crate::response;
use crate::services::dashboard;
use crate::state::AppState;
use crate::validation::{self, ValidationErrors};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(get_dashboard))
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/courses/{id}/hometasks", get(list_course_hometasks))
        .route("/hometasks", get(list_hometasks).post(create_hometask))
        .route(
            "/hometasks/{id}",
            get(get_hometask).put(update_hometask).delete(delete_hometask),
        )
        .route("/hometasks/{id}/complete", patch(complete_hometask))
        .with_state(state)
}

/// Path parameters are shape-checked before any storage access.
fn checked_id(id: &str) -> Result<&str, AppError> {
    if validation::is_valid_id(id) {
        Ok(id)
    } else {
        Err(AppError::InvalidId)
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let db = match sqlx::query("select 1").execute(&state.db).await {
        Ok(_) => "up",
        Err(err) => {
            tracing::error!("health check failed: {}", err);
            "down"
        }
    };
    Json(json!({ "status": "ok", "db": db }))
}

async fn list_courses(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let courses = repository::fetch_courses(&state.db).await?;
    Ok(response::ok(courses))
}

async fn create_course(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let new_course = validation::validate_new_course(&body).map_err(AppError::Validation)?;
    let course = repository::insert_course(&state.db, new_course).await?;
    Ok(response::created(course))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = checked_id(&id)?;
    let course = repository::find_course(&state.db, id)
        .await?
        .ok_or(AppError::CourseNotFound)?;
    Ok(response::ok(course))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = checked_id(&id)?;
    let Json(body) = payload?;
    let update = validation::validate_course_update(&body).map_err(AppError::Validation)?;
    let course = repository::update_course(&state.db, id, update).await?;
    Ok(response::ok(course))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = checked_id(&id)?;
    repository::delete_course(&state.db, id).await?;
    Ok(response::ok_message("Course deleted"))
}

async fn list_course_hometasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = checked_id(&id)?;
    let now = Utc::now();
    let tasks = repository::fetch_hometasks_by_course(&state.db, id).await?;
    let tasks: Vec<_> = tasks.into_iter().map(|t| t.with_overdue(now)).collect();
    Ok(response::ok(tasks))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HometaskQuery {
    status: Option<String>,
    course_id: Option<String>,
}

impl HometaskQuery {
    fn into_filter(self) -> Result<HometaskFilter, AppError> {
        let mut filter = HometaskFilter::default();
        if let Some(raw) = self.status {
            match TaskStatus::parse(&raw) {
                Some(status) => filter.status = Some(status),
                None => {
                    let mut errors = ValidationErrors::new();
                    errors.insert(
                        "status",
                        "Status must be either 'pending' or 'completed'".to_string(),
                    );
                    return Err(AppError::Validation(errors));
                }
            }
        }
        if let Some(course_id) = self.course_id {
            if !validation::is_valid_id(&course_id) {
                return Err(AppError::InvalidId);
            }
            filter.course_id = Some(course_id);
        }
        Ok(filter)
    }
}

async fn list_hometasks(
    State(state): State<AppState>,
    query: Result<Query<HometaskQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query?;
    let filter = params.into_filter()?;
    let now = Utc::now();
    let tasks = repository::fetch_hometasks(&state.db, filter).await?;
    let tasks: Vec<_> = tasks.into_iter().map(|t| t.with_overdue(now)).collect();
    Ok(response::ok(tasks))
}

async fn create_hometask(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let new_task =
        validation::validate_new_hometask(&body, Utc::now()).map_err(AppError::Validation)?;
    let task = repository::insert_hometask(&state.db, new_task).await?;
    Ok(response::created(task))
}

async fn get_hometask(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = checked_id(&id)?;
    let task = repository::find_hometask(&state.db, id)
        .await?
        .ok_or(AppError::HometaskNotFound)?;
    Ok(response::ok(task.with_overdue(Utc::now())))
}

async fn update_hometask(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = checked_id(&id)?;
    let Json(body) = payload?;
    let update =
        validation::validate_hometask_update(&body, Utc::now()).map_err(AppError::Validation)?;
    let task = repository::update_hometask(&state.db, id, update).await?;
    Ok(response::ok(task.with_overdue(Utc::now())))
}

async fn complete_hometask(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = checked_id(&id)?;
    let task = repository::complete_hometask(&state.db, id).await?;
    Ok(response::ok(task.with_overdue(Utc::now())))
}

async fn delete_hometask(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = checked_id(&id)?;
    repository::delete_hometask(&state.db, id).await?;
    Ok(response::ok_message("Hometask deleted"))
}

async fn get_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let courses = repository::fetch_courses(&state.db).await?;
    let tasks = repository::fetch_hometasks(&state.db, HometaskFilter::default()).await?;
    let dashboard = dashboard::build_dashboard(courses, tasks, Utc::now());
    Ok(response::ok(dashboard))
}
