//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use claimcheck_core::PipelineError;
use serde::Serialize;

/// Failure of a `/predict` request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// `text` or `image` absent or empty, or the body isn't parseable multipart.
    #[error("Missing input")]
    MissingInput,

    /// Upload exceeded `limits.max_upload_mb`.
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// Anything the pipeline reported after the inputs were accepted.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Prediction failed: {self}");
        } else {
            tracing::debug!("Rejected request: {self}");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_has_fixed_message() {
        assert_eq!(ApiError::MissingInput.to_string(), "Missing input");
        assert_eq!(ApiError::MissingInput.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pipeline_errors_become_internal() {
        let err: ApiError = PipelineError::Decode {
            message: "bad header".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("bad header"));
    }
}
