//! Download endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use tubefetch_core::format::bytes_to_mb;
use tubefetch_core::{DownloadRequest, JobReport, MediaKind, SourceInput};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBody {
    pub url: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub quality: Option<String>,
    pub format_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub success: bool,
    pub download_id: String,
    pub filename: String,
    #[serde(rename = "fileSizeMB")]
    pub file_size_mb: f64,
    pub download_url: String,
    pub file_url: String,
    pub expires_at: DateTime<Utc>,
    pub oversized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn oversize_warning(report: &JobReport, threshold_mb: u64) -> String {
    let size_mb = bytes_to_mb(report.artifact.size_bytes);
    let advice = match (report.job.request.kind(), report.job.request.quality().lower()) {
        (MediaKind::Video, Some(lower)) => {
            format!("Try quality '{}' or type 'audio' for a smaller file.", lower)
        }
        (MediaKind::Video, None) => "Try type 'audio' for a smaller file.".to_string(),
        (MediaKind::Audio, Some(lower)) => {
            format!("Try quality '{}' for a smaller file.", lower)
        }
        (MediaKind::Audio, None) => "Try shorter media for a smaller file.".to_string(),
    };
    format!(
        "File is {:.2} MB, above the {} MB size warning threshold. {}",
        size_mb, threshold_mb, advice
    )
}

/// Runs a download job to completion and returns retrieval links.
pub async fn download(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let Json(body) = body?;

    let request = DownloadRequest::from_fields(
        &SourceInput::new(body.url, body.search),
        body.kind.as_deref(),
        body.quality.as_deref(),
        body.format_id.as_deref(),
    )?;

    let report = state.runner().download(request).await?;

    let warning = report
        .oversized
        .then(|| oversize_warning(&report, state.config().storage.size_warning_mb));
    let filename = report.artifact.filename.clone();

    info!(
        download_id = %report.job.id,
        file = %filename,
        "Download ready"
    );

    Ok(Json(DownloadResponse {
        success: true,
        download_id: report.job.id.to_string(),
        file_size_mb: bytes_to_mb(report.artifact.size_bytes),
        download_url: state.link("stream", &filename),
        file_url: state.link("file", &filename),
        expires_at: report.artifact.expires_at,
        oversized: report.oversized,
        warning,
        filename,
    }))
}
