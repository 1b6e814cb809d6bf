//! Artifact retrieval and cleanup endpoints.

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use super::error::ApiError;
use crate::state::AppState;

/// Files listed in a cleanup response.
const CLEANUP_SAMPLE: usize = 10;

async fn serve_artifact(
    state: &AppState,
    filename: &str,
    request: Request,
    attachment: bool,
) -> Result<Response, ApiError> {
    let artifact = state
        .store()
        .get(filename)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("File not found: {}", filename)))?;

    debug!(file = %artifact.filename, attachment, "Serving artifact");

    let response = match ServeFile::new(&artifact.path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = response.map(Body::new).into_response();

    if attachment {
        let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
    }

    Ok(response)
}

/// Sends an artifact as a download attachment.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    serve_artifact(&state, &filename, request, true).await
}

/// Serves an artifact inline.
pub async fn file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    serve_artifact(&state, &filename, request, false).await
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted: usize,
    pub failed: usize,
    pub forgotten: usize,
    pub freed_bytes: u64,
    pub remaining: usize,
    pub files: Vec<String>,
}

/// Runs a garbage collection sweep immediately.
pub async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<CleanupResponse>, ApiError> {
    let report = state.gc().sweep().await?;
    let stats = state.store().stats().await?;
    let files = state.store().list_files(CLEANUP_SAMPLE).await?;

    Ok(Json(CleanupResponse {
        success: true,
        deleted: report.deleted,
        failed: report.failed,
        forgotten: report.forgotten,
        freed_bytes: report.freed_bytes,
        remaining: stats.file_count,
        files,
    }))
}
