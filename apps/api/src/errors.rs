use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::search_client::SearchError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        reset_in_seconds: u64,
    },

    #[error("Search backend error: {0}")]
    Search(String),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err.rate_limit() {
            Some(notice) => AppError::RateLimited {
                message: notice.message.clone(),
                reset_in_seconds: notice.reset_in_seconds,
            },
            None => AppError::Search(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::RateLimited {
                message,
                reset_in_seconds,
            } => {
                let body = Json(json!({
                    "error": {
                        "code": "RATE_LIMITED",
                        "message": message,
                        "reset_in_seconds": reset_in_seconds
                    }
                }));
                return (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            }
            AppError::Search(msg) => {
                tracing::error!("Search backend error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SEARCH_ERROR",
                    "The search service is unavailable".to_string(),
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
