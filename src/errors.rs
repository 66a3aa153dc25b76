// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("State error: {0}")]
    StateError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            AppError::StateError(_) => (StatusCode::CONFLICT, "Invalid state"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Update conflict"),
            AppError::ConfigurationError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error")
            }
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        AppError::StateError(msg.into())
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        AppError::NotFound(format!("{} '{}'", what, id))
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
