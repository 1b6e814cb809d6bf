//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (outcomes, duration, admission)
//! - Search and metadata lookups
//! - Artifact garbage collection

use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs total by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tubefetch_jobs_total", "Total download jobs"),
        &["result"], // "success", "invalid_request", "tool_error", "timeout", ...
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tubefetch_job_duration_seconds",
            "Duration of download jobs",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

/// Jobs currently holding an admission permit.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tubefetch_jobs_active",
        "Number of jobs currently running the downloader",
    )
    .unwrap()
});

/// Jobs waiting for an admission permit.
pub static JOBS_WAITING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tubefetch_jobs_waiting",
        "Number of jobs waiting for an admission permit",
    )
    .unwrap()
});

/// Artifact size in bytes.
pub static ARTIFACT_SIZE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("tubefetch_artifact_size_bytes", "Size of produced artifacts")
            .buckets(vec![
                1e6, 5e6, 10e6, 25e6, 50e6, 100e6, 250e6, 500e6, 1e9, 2e9,
            ]),
        &["kind"], // "video", "audio"
    )
    .unwrap()
});

// =============================================================================
// Lookup Metrics
// =============================================================================

/// Search and metadata lookups by operation and status.
pub static LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tubefetch_lookups_total", "Total search and info lookups"),
        &["operation", "status"], // operation: "search", "info"; status: "success", "error"
    )
    .unwrap()
});

/// Search results returned per query.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "tubefetch_search_results",
            "Number of search results returned per query",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0]),
    )
    .unwrap()
});

// =============================================================================
// Garbage Collection Metrics
// =============================================================================

/// Sweeps completed.
pub static GC_SWEEPS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("tubefetch_gc_sweeps_total", "Total garbage collection sweeps").unwrap()
});

/// Expired files deleted.
pub static GC_FILES_DELETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubefetch_gc_files_deleted_total",
        "Total expired artifact files deleted",
    )
    .unwrap()
});

/// Expired files that could not be deleted.
pub static GC_DELETE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubefetch_gc_delete_failures_total",
        "Total artifact deletions that failed",
    )
    .unwrap()
});

/// Bytes reclaimed.
pub static GC_BYTES_FREED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubefetch_gc_bytes_freed_total",
        "Total bytes reclaimed by garbage collection",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        Box::new(JOBS_WAITING.clone()),
        Box::new(ARTIFACT_SIZE.clone()),
        // Lookups
        Box::new(LOOKUPS_TOTAL.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        // Garbage collection
        Box::new(GC_SWEEPS.clone()),
        Box::new(GC_FILES_DELETED.clone()),
        Box::new(GC_DELETE_FAILURES.clone()),
        Box::new(GC_BYTES_FREED.clone()),
    ]
}
