use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

use crate::validation::ValidationErrors;

/// Uniform response wrapper; every route answers with this shape, success
/// or failure.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            code: None,
            errors: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            code: None,
            errors: None,
        }
    }

    pub fn failure(code: &'static str, message: String, errors: Option<ValidationErrors>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            code: Some(code),
            errors,
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::data(data)))
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::data(data)))
}

pub fn ok_message(message: &str) -> (StatusCode, Json<Envelope<()>>) {
    (StatusCode::OK, Json(Envelope::message(message)))
}
