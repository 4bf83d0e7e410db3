use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Shown to callers whenever backend output cannot be parsed into job records.
/// Oversized pages are by far the most common cause, so the message names that.
pub const EXTRACTION_PARSE_MESSAGE: &str = "Context too big. Unable to parse jobs.";

/// Failure kinds of the extraction / retrieval / composition pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Query must contain at least one non-blank skill term")]
    EmptyQuery,

    #[error("{}", EXTRACTION_PARSE_MESSAGE)]
    ExtractionParse,

    #[error("Portfolio index load failed: {0}")]
    IndexLoad(String),

    #[error("Backend call timed out after {}s", .0.as_secs())]
    BackendTimeout(Duration),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Pipeline(err) => pipeline_status(err),
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

fn pipeline_status(err: &PipelineError) -> (StatusCode, &'static str, String) {
    match err {
        PipelineError::EmptyInput(_) => (StatusCode::BAD_REQUEST, "EMPTY_INPUT", err.to_string()),
        PipelineError::EmptyQuery => (StatusCode::BAD_REQUEST, "EMPTY_QUERY", err.to_string()),
        PipelineError::ExtractionParse => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "EXTRACTION_PARSE_ERROR",
            err.to_string(),
        ),
        PipelineError::IndexLoad(msg) => {
            tracing::error!("Index load error: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INDEX_LOAD_ERROR",
                err.to_string(),
            )
        }
        PipelineError::BackendTimeout(_) => {
            (StatusCode::GATEWAY_TIMEOUT, "BACKEND_TIMEOUT", err.to_string())
        }
        PipelineError::BackendUnavailable(msg) => {
            tracing::error!("Backend error: {msg}");
            (
                StatusCode::BAD_GATEWAY,
                "BACKEND_UNAVAILABLE",
                "The generation backend is unavailable".to_string(),
            )
        }
        PipelineError::Cancelled => (StatusCode::REQUEST_TIMEOUT, "CANCELLED", err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_parse_message_is_fixed() {
        assert_eq!(
            PipelineError::ExtractionParse.to_string(),
            "Context too big. Unable to parse jobs."
        );
    }

    #[test]
    fn test_extraction_parse_maps_to_422() {
        let response = AppError::from(PipelineError::ExtractionParse).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_empty_input_maps_to_400() {
        let response =
            AppError::from(PipelineError::EmptyInput("page_text".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timeout_maps_to_504() {
        let response =
            AppError::from(PipelineError::BackendTimeout(Duration::from_secs(5))).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_validation_maps_to_400_with_code() {
        let response = AppError::Validation("k must be at most 20".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_index_load_maps_to_500() {
        let response = AppError::from(PipelineError::IndexLoad("missing".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_timeout_message_names_duration() {
        let err = PipelineError::BackendTimeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Backend call timed out after 30s");
    }
}
