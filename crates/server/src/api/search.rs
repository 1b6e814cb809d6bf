//! Search and metadata endpoints.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tubefetch_core::{MediaInfo, SearchHit};

use super::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchHit>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::bad_request("query parameter 'q' is required"));
    }

    let results = state
        .runner()
        .search(&query, params.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;

    Ok(Json(SearchResponse {
        success: true,
        query: query.trim().to_string(),
        count: results.len(),
        results,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InfoParams {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub success: bool,
    #[serde(flatten)]
    pub info: MediaInfo,
}

pub async fn info(
    State(state): State<Arc<AppState>>,
    params: Result<Query<InfoParams>, QueryRejection>,
) -> Result<Json<InfoResponse>, ApiError> {
    let Query(params) = params?;
    let url = params.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(ApiError::bad_request("query parameter 'url' is required"));
    }

    let info = state.runner().info(&url).await?;
    Ok(Json(InfoResponse {
        success: true,
        info,
    }))
}
