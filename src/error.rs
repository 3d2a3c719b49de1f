use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Field name -> messages, as returned in the `errors` object of a 400.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), vec![message.into()]);
        AppError::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "status": "fail",
                    "message": "One or more validation errors occurred",
                    "errors": errors,
                }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "status": "fail",
                    "message": "You are not logged in, please provide a valid token",
                }),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "status": "fail",
                    "message": "Resource not found",
                }),
            ),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                json!({
                    "status": "fail",
                    "message": message,
                }),
            ),
            err @ (AppError::Persistence(_) | AppError::Internal(_)) => {
                let trace_id = uuid::Uuid::new_v4().to_string();
                tracing::error!(%trace_id, error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "status": "error",
                        "message": "An error occurred while processing your request",
                        "traceId": trace_id,
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// True when `err` is a UNIQUE constraint violation reported by the database.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
