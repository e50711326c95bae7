use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::response::Envelope;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(ValidationErrors),

    /// Malformed path or reference ID; deliberately distinct from the
    /// not-found variants so clients can tell a bad request from a
    /// missing record.
    #[error("invalid id format")]
    InvalidId,

    #[error("course not found")]
    CourseNotFound,

    #[error("hometask not found")]
    HometaskNotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, errors) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "dtoInIsNotValid",
                "Validation failed".to_string(),
                Some(errors),
            ),
            AppError::InvalidId => (
                StatusCode::BAD_REQUEST,
                "dtoInIsNotValid",
                "Invalid ID format".to_string(),
                None,
            ),
            AppError::CourseNotFound => (
                StatusCode::NOT_FOUND,
                "courseDoesNotExist",
                "Course not found".to_string(),
                None,
            ),
            AppError::HometaskNotFound => (
                StatusCode::NOT_FOUND,
                "hometaskDoesNotExist",
                "Hometask not found".to_string(),
                None,
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "dtoInIsNotValid", msg, None)
            }
            AppError::Database(e) => {
                // details go to the log, never to the client
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalServerError",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (status, Json(Envelope::<()>::failure(code, message, errors))).into_response()
    }
}
