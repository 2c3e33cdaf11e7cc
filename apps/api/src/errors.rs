use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::interpreter::SchemaMismatch;
use crate::llm_client::LlmError;
use crate::resumes::extract::ExtractError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("PDF extraction timed out after {0:?}")]
    ExtractionTimeout(Duration),

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] LlmError),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatch),

    #[error("No resumes in storage")]
    NoResumes,

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Timeout(limit) => AppError::ExtractionTimeout(limit),
            other => AppError::Extraction(other.to_string()),
        }
    }
}

impl AppError {
    /// Maps a failed insert to `Conflict` when a UNIQUE constraint rejected it.
    pub fn from_insert(e: sqlx::Error, what: &str) -> Self {
        match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("{what} already exists"))
            }
            _ => AppError::Persistence(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::ExtractionTimeout(_) => (
                StatusCode::REQUEST_TIMEOUT,
                "EXTRACTION_TIMEOUT",
                self.to_string(),
            ),
            AppError::Extraction(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                msg.clone(),
            ),
            AppError::Upstream(e) => {
                tracing::error!("Upstream LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Unexpected response from the analysis model".to_string(),
                )
            }
            AppError::SchemaMismatch(e) => {
                tracing::error!("LLM output failed schema validation: {e}");
                (StatusCode::BAD_GATEWAY, "SCHEMA_MISMATCH", e.to_string())
            }
            AppError::NoResumes => (
                StatusCode::BAD_REQUEST,
                "NO_RESUMES",
                "No resumes in database. Upload resumes first.".to_string(),
            ),
            AppError::Persistence(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Snapshot(e) => {
                tracing::error!("Snapshot write failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NoResumes, StatusCode::BAD_REQUEST),
            (AppError::Configuration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::ExtractionTimeout(Duration::from_secs(30)), StatusCode::REQUEST_TIMEOUT),
            (AppError::Upstream(LlmError::EmptyContent), StatusCode::BAD_GATEWAY),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_extract_timeout_maps_to_timeout_variant() {
        let err: AppError = ExtractError::Timeout(Duration::from_millis(500)).into();
        assert!(matches!(err, AppError::ExtractionTimeout(d) if d == Duration::from_millis(500)));
        assert_eq!(err.to_string(), "PDF extraction timed out after 500ms");
    }
}
