use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
    pub qualities: Vec<&'static str>,
    pub types: Vec<&'static str>,
    pub ttl_secs: u64,
}

pub async fn index(State(state): State<Arc<AppState>>) -> Json<ServiceDescriptor> {
    let endpoint = |method, path, description| EndpointInfo {
        method,
        path,
        description,
    };

    Json(ServiceDescriptor {
        name: "tubefetch",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            endpoint("GET", "/health", "Liveness and artifact directory stats"),
            endpoint("GET", "/search?q=&limit=", "Search for media"),
            endpoint("GET", "/info?url=", "Metadata and available formats"),
            endpoint("POST", "/download", "Download media and return retrieval links"),
            endpoint("GET", "/stream/{filename}", "Download an artifact as attachment"),
            endpoint("GET", "/file/{filename}", "Serve an artifact directly"),
            endpoint("GET", "/cleanup", "Run a garbage collection sweep now"),
            endpoint("GET", "/metrics", "Prometheus metrics"),
        ],
        qualities: vec!["low", "medium", "high", "best"],
        types: vec!["video", "audio"],
        ttl_secs: state.config().storage.ttl_secs,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub artifact_count: usize,
    pub artifact_bytes: u64,
    pub active_jobs: usize,
    pub ttl_secs: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let stats = state.store().stats().await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        artifact_count: stats.file_count,
        artifact_bytes: stats.total_bytes,
        active_jobs: state.runner().active_jobs(),
        ttl_secs: state.config().storage.ttl_secs,
    }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
