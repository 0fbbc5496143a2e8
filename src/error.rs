use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Session expired")]
    SessionExpired,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)", "code": "conflict" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string()),
            AppError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "session_expired",
                "Session expired, please log in again".to_string(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            AppError::Configuration(msg) => {
                error!("Package configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration", "Package is misconfigured".to_string())
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

/// Errors produced by the availability, wizard, recovery and submission core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    /// Malformed package data. Fatal, never retried.
    #[error("Invalid package configuration: {0}")]
    Configuration(String),
    /// User-fixable; blocks the current step.
    #[error("{0}")]
    Validation(String),
    #[error("Please log in to continue your booking")]
    AuthenticationRequired,
    #[error("Your session has expired, please log in again")]
    SessionExpired,
    #[error("Something went wrong, please try again: {0}")]
    Transport(String),
    /// Internal signal for out-of-order availability responses.
    #[error("Stale availability response discarded")]
    StaleDataDiscarded,
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("A submission is already in progress")]
    SubmissionInProgress,
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    /// Whether the caller may retry the same action without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Transport(_) | BookingError::SessionExpired)
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Configuration(msg) => AppError::Configuration(msg),
            BookingError::Validation(msg) => AppError::Validation(msg),
            BookingError::AuthenticationRequired => AppError::Unauthorized,
            BookingError::SessionExpired => AppError::SessionExpired,
            BookingError::InvalidTransition { .. } | BookingError::SubmissionInProgress => {
                AppError::Conflict(err.to_string())
            }
            BookingError::Transport(msg) | BookingError::Storage(msg) => AppError::InternalWithMsg(msg),
            BookingError::StaleDataDiscarded => AppError::Internal,
        }
    }
}
