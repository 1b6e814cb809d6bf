//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running a fetch job.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request is missing a usable source or carries bad parameters.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The external tool exited with a non-zero status.
    #[error("Downloader failed: {message}")]
    ToolError {
        exit_code: Option<i32>,
        message: String,
    },

    /// The external tool exceeded its wall-clock limit and was killed.
    #[error("Downloader timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The tool exited cleanly but produced no usable file.
    #[error("No output file found for job {job_id} in {}", .dir.display())]
    ArtifactMissing { job_id: String, dir: PathBuf },

    /// The external tool could not be started.
    #[error("Failed to start {}: {reason}", .program.display())]
    SpawnError { program: PathBuf, reason: String },

    /// The tool's output could not be parsed.
    #[error("Failed to parse downloader output: {reason}")]
    Parse { reason: String },

    /// I/O error while handling artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Creates an invalid request error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable name for the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "InvalidRequest",
            Self::ToolError { .. } => "ToolError",
            Self::Timeout { .. } => "Timeout",
            Self::ArtifactMissing { .. } => "ArtifactMissing",
            Self::SpawnError { .. } => "SpawnError",
            Self::Parse { .. } => "ParseError",
            Self::Io(_) => "IoError",
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. })
    }

    /// A remediation hint for the caller, when there is one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } => {
                Some("The download took too long. Try a lower quality or shorter media.")
            }
            Self::ArtifactMissing { .. } => {
                Some("The requested format may not be available. Try another quality or format.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(FetchError::invalid_request("x").kind(), "InvalidRequest");
        assert_eq!(FetchError::Timeout { timeout_secs: 1 }.kind(), "Timeout");
        assert_eq!(
            FetchError::SpawnError {
                program: PathBuf::from("yt-dlp"),
                reason: "not found".to_string()
            }
            .kind(),
            "SpawnError"
        );
    }

    #[test]
    fn test_only_invalid_request_is_client_error() {
        assert!(FetchError::invalid_request("empty").is_client_error());
        assert!(!FetchError::Timeout { timeout_secs: 5 }.is_client_error());
        assert!(!FetchError::ToolError {
            exit_code: Some(1),
            message: "boom".to_string()
        }
        .is_client_error());
    }

    #[test]
    fn test_timeout_has_hint() {
        assert!(FetchError::Timeout { timeout_secs: 5 }.hint().is_some());
        assert!(FetchError::invalid_request("x").hint().is_none());
    }

    #[test]
    fn test_tool_error_display_wraps_message() {
        let err = FetchError::ToolError {
            exit_code: Some(1),
            message: "ERROR: Video unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Downloader failed: ERROR: Video unavailable");
    }
}
