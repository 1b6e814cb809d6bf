//! Types for the artifact module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A retrievable output file of a succeeded job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// `created_at + ttl`. The file may be swept any time after this.
    pub expires_at: DateTime<Utc>,
}

/// Retention policy shared by the store and the garbage collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// Minimum age before a file may be deleted.
    pub ttl: Duration,
    /// Period between background sweeps.
    pub sweep_interval: Duration,
}

/// A file picked by the output resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub filename: String,
    pub size_bytes: u64,
}

/// Outcome of one garbage collection sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Regular files examined.
    pub scanned: usize,
    pub deleted: usize,
    /// Expired files that could not be removed.
    pub failed: usize,
    /// Files younger than the TTL.
    pub retained: usize,
    pub freed_bytes: u64,
    /// Registry entries dropped because their file was gone.
    pub forgotten: usize,
}

/// Snapshot of the artifact directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub file_count: usize,
    pub total_bytes: u64,
}
