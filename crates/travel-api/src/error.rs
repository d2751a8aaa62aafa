//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use travel_core::{ErrorKind, PipelineError};

#[derive(Error, Debug)]
pub enum ApiError {
    /// Request failed validation; carries the offending field
    #[error("Bad request: {message}")]
    BadRequest { field: &'static str, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn bad_request(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Pipeline(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Invalid => StatusCode::UNAUTHORIZED,
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// JSON error envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut details = BTreeMap::new();

        let message = match &self {
            ApiError::BadRequest { field, message } => {
                details.insert(field.to_string(), vec![message.clone()]);
                "invalid request".to_string()
            }
            ApiError::Unauthorized(msg) => {
                details.insert("error".to_string(), vec![msg.clone()]);
                "unauthorized".to_string()
            }
            ApiError::Pipeline(e) => {
                details.insert("error".to_string(), vec![e.to_string()]);
                details.insert("kind".to_string(), vec![e.kind().to_string()]);
                match e.kind() {
                    ErrorKind::NotFound => "not found",
                    ErrorKind::Conflict => "already exists",
                    ErrorKind::Invalid => "unauthorized",
                    ErrorKind::Timeout => "timed out",
                    ErrorKind::Infrastructure => "internal error",
                }
                .to_string()
            }
        };

        (status, axum::Json(ErrorResponse { message, details })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pipeline_kinds_map_to_status() {
        let cases = [
            (PipelineError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PipelineError::Conflict("x".into()), StatusCode::CONFLICT),
            (PipelineError::Invalid("x".into()), StatusCode::UNAUTHORIZED),
            (PipelineError::Timeout(Duration::from_secs(5)), StatusCode::GATEWAY_TIMEOUT),
            (
                PipelineError::infrastructure("storage failure", "boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = ApiError::bad_request("username", "Username cannot be empty");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
