//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the tubefetch server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Artifact directory usage (collected dynamically)
//! - Core job and garbage collection metrics (registered from the core crate)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tubefetch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tubefetch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tubefetch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Artifact Metrics (collected dynamically)
// =============================================================================

/// Files in the artifact directory.
pub static ARTIFACT_FILES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tubefetch_artifact_files",
        "Number of files in the artifact directory",
    )
    .unwrap()
});

/// Bytes in the artifact directory.
pub static ARTIFACT_BYTES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tubefetch_artifact_bytes",
        "Total size of files in the artifact directory",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Artifacts
    registry
        .register(Box::new(ARTIFACT_FILES.clone()))
        .unwrap();
    registry
        .register(Box::new(ARTIFACT_BYTES.clone()))
        .unwrap();

    // Core metrics (jobs, lookups, garbage collection)
    for metric in tubefetch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.store().stats().await {
        Ok(stats) => {
            ARTIFACT_FILES.set(stats.file_count as i64);
            ARTIFACT_BYTES.set(stats.total_bytes as i64);
        }
        Err(e) => warn!("Failed to read artifact directory stats: {}", e),
    }
}

static JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-f]{32}").unwrap());
static FILE_ROUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/(stream|file)/.+$").unwrap());

/// Normalize a path for metric labels (replace file names and IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = FILE_ROUTE.replace(path, "/$1/{filename}");
    let result = JOB_ID.replace_all(&result, "{id}");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_file_routes() {
        assert_eq!(
            normalize_path("/stream/0123456789abcdef0123456789abcdef.mp4"),
            "/stream/{filename}"
        );
        assert_eq!(normalize_path("/file/whatever.mp3"), "/file/{filename}");
    }

    #[test]
    fn test_normalize_path_job_id() {
        assert_eq!(
            normalize_path("/jobs/0123456789abcdef0123456789abcdef"),
            "/jobs/{id}"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/download"), "/download");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("tubefetch_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs metrics that have been touched
        tubefetch_core::metrics::JOBS_TOTAL
            .with_label_values(&["success"])
            .inc_by(0);
        tubefetch_core::metrics::GC_SWEEPS.inc_by(0);
        ARTIFACT_FILES.set(0);

        let output = encode_metrics();
        assert!(output.contains("tubefetch_jobs_total"));
        assert!(output.contains("tubefetch_gc_sweeps_total"));
        assert!(output.contains("tubefetch_artifact_files"));
    }
}
