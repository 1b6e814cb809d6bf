use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{download, files, handlers, middleware::metrics_middleware, search};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Service
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Lookups
        .route("/search", get(search::search))
        .route("/info", get(search::info))
        // Jobs
        .route("/download", post(download::download))
        // Artifacts
        .route("/stream/{filename}", get(files::stream))
        .route("/file/{filename}", get(files::file))
        .route("/cleanup", get(files::cleanup))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
