//! TTL garbage collector for the artifact directory.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::store::ArtifactStore;
use super::types::{CleanupPolicy, SweepReport};
use crate::metrics;

/// Deletes artifact files older than the TTL.
///
/// Runs concurrently with jobs. It only looks at file age, so a file being
/// written by an in-flight job is safe as long as the job timeout stays
/// below the TTL (enforced by config validation).
pub struct GarbageCollector {
    store: Arc<ArtifactStore>,
    policy: CleanupPolicy,
}

impl GarbageCollector {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        let policy = store.policy();
        Self { store, policy }
    }

    pub fn policy(&self) -> CleanupPolicy {
        self.policy
    }

    /// Sweeps using the current wall clock.
    pub async fn sweep(&self) -> std::io::Result<SweepReport> {
        self.sweep_at(SystemTime::now()).await
    }

    /// Sweeps as if the current time were `now`.
    ///
    /// Deletes every regular file whose age is at least the TTL. Age counts
    /// from the later of the file's mtime and, for registered artifacts, the
    /// registration time; a timestamp in the future counts as age zero.
    /// Registry entries whose file is no longer on disk are dropped.
    /// Per-file failures are counted and logged; only failing to list the
    /// directory is an error.
    pub async fn sweep_at(&self, now: SystemTime) -> std::io::Result<SweepReport> {
        let mut report = SweepReport::default();
        // Snapshot before the scan: anything registered later may not be listed yet
        let registered = self.store.registered_times().await;
        let mut seen = HashSet::new();

        let mut entries = match tokio::fs::read_dir(self.store.dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            seen.insert(filename.clone());

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            report.scanned += 1;

            let registered_at = registered.get(&filename).map(|t| SystemTime::from(*t));
            let written_at = match (metadata.modified().ok(), registered_at) {
                (Some(mtime), Some(reg)) => Some(mtime.max(reg)),
                (mtime, reg) => mtime.or(reg),
            };
            let age = written_at
                .and_then(|t| now.duration_since(t).ok())
                .unwrap_or(Duration::ZERO);
            if age < self.policy.ttl {
                report.retained += 1;
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    debug!(file = %filename, age_secs = age.as_secs(), "Deleted expired artifact");
                    report.deleted += 1;
                    report.freed_bytes += metadata.len();
                    self.store.forget(&filename).await;
                }
                Err(e) => {
                    warn!(file = %filename, error = %e, "Failed to delete expired artifact");
                    report.failed += 1;
                }
            }
        }

        for name in registered.keys().filter(|name| !seen.contains(*name)) {
            debug!(file = %name, "Forgetting artifact removed outside the collector");
            self.store.forget(name).await;
            report.forgotten += 1;
        }

        metrics::GC_SWEEPS.inc();
        metrics::GC_FILES_DELETED.inc_by(report.deleted as u64);
        metrics::GC_DELETE_FAILURES.inc_by(report.failed as u64);
        metrics::GC_BYTES_FREED.inc_by(report.freed_bytes);

        if report.deleted > 0 || report.failed > 0 || report.forgotten > 0 {
            info!(
                deleted = report.deleted,
                failed = report.failed,
                forgotten = report.forgotten,
                retained = report.retained,
                freed_bytes = report.freed_bytes,
                "Garbage collection sweep finished"
            );
        }

        Ok(report)
    }

    /// Runs sweeps on a timer until `shutdown` fires.
    ///
    /// The first sweep happens immediately, clearing leftovers from a
    /// previous run.
    pub fn spawn(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.policy.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                ttl_secs = self.policy.ttl.as_secs(),
                interval_secs = self.policy.sweep_interval.as_secs(),
                "Garbage collector started"
            );
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!("Garbage collector received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep().await {
                            warn!("Garbage collection sweep failed: {}", e);
                        }
                    }
                }
            }
            info!("Garbage collector stopped");
        })
    }
}
