//! Application error taxonomy and HTTP error rendering.
//!
//! Expected outcomes (validation, authorization, not-found, paused, conflict)
//! are returned to callers for translation into responses. Internal failures
//! raised by background work never reach a caller; they are logged instead.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::infrastructure::cache::CacheError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Public error payload rendered in every error response.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    Unauthorized { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    /// The link exists but access to it is blocked.
    ///
    /// Rendered exactly like [`AppError::NotFound`] so that link existence is
    /// not leaked, but kept distinct for logging and metrics.
    #[error("{message}")]
    Paused { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn paused(message: impl Into<String>, details: Value) -> Self {
        Self::Paused {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Short machine-readable category, used as a log field and metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation",
            AppError::Unauthorized { .. } => "unauthorized",
            AppError::NotFound { .. } => "not_found",
            AppError::Paused { .. } => "paused",
            AppError::Conflict { .. } => "conflict",
            AppError::Internal { .. } => "internal",
        }
    }

    /// Converts the error into the public payload and its status code.
    pub fn to_error_info(&self) -> (StatusCode, ErrorInfo) {
        match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                ErrorInfo {
                    code: "validation_error",
                    message: message.clone(),
                    details: details.clone(),
                },
            ),
            AppError::Unauthorized { message, details } => (
                StatusCode::UNAUTHORIZED,
                ErrorInfo {
                    code: "unauthorized",
                    message: message.clone(),
                    details: details.clone(),
                },
            ),
            AppError::NotFound { .. } | AppError::Paused { .. } => (
                StatusCode::NOT_FOUND,
                ErrorInfo {
                    code: "not_found",
                    message: "Link not found".to_string(),
                    details: json!({}),
                },
            ),
            AppError::Conflict { message, details } => (
                StatusCode::CONFLICT,
                ErrorInfo {
                    code: "conflict",
                    message: message.clone(),
                    details: details.clone(),
                },
            ),
            AppError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorInfo {
                    code: "internal_error",
                    message: "An internal error occurred".to_string(),
                    details: json!({}),
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal { message, details } = &self {
            tracing::error!(%message, %details, "request failed with internal error");
        }

        let (status, error) = self.to_error_info();

        (status, Json(ErrorBody { error })).into_response()
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    AppError::internal("Database error", json!({ "reason": e.to_string() }))
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::internal("Cache error", json!({ "reason": e.to_string() }))
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::bad_request("Invalid request body", json!({ "reason": e.body_text() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Invalid input", json!({ "reason": e.to_string() }))
    }
}
