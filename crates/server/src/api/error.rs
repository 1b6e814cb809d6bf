//! JSON error responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use tubefetch_core::{FetchError, JobFailure};

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: message.into(),
                kind: "InvalidRequest".to_string(),
                hint: None,
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse {
                error: message.into(),
                kind: "NotFound".to_string(),
                hint: None,
            },
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if matches!(e, FetchError::SpawnError { .. }) {
            error!("Downloader could not be started: {}", e);
        }

        Self {
            status,
            body: ErrorResponse {
                error: e.to_string(),
                kind: e.kind().to_string(),
                hint: e.hint().map(str::to_string),
            },
        }
    }
}

impl From<JobFailure> for ApiError {
    fn from(failure: JobFailure) -> Self {
        failure.error.into()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Io(e).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_400() {
        let err = ApiError::from(FetchError::invalid_request("url or search is required"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.kind, "InvalidRequest");
        assert!(err.body.hint.is_none());
    }

    #[test]
    fn test_timeout_maps_to_500_with_hint() {
        let err = ApiError::from(FetchError::Timeout { timeout_secs: 120 });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.kind, "Timeout");
        assert!(err.body.hint.unwrap().contains("lower quality"));
    }

    #[test]
    fn test_tool_error_maps_to_500() {
        let err = ApiError::from(FetchError::ToolError {
            exit_code: Some(1),
            message: "ERROR: Video unavailable".to_string(),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.body.error.contains("Video unavailable"));
    }
}
