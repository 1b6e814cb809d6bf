//! Locating a job's output file.
//!
//! The tool picks the final extension itself, and a merge or post-processing
//! step can leave more than one file behind. All files of a job share the job
//! id as a name prefix, so the resolver scans by prefix and keeps the largest.

use std::path::Path;
use tracing::{debug, warn};

use super::types::ResolvedFile;
use crate::fetcher::FetchError;
use crate::jobs::JobId;

async fn prefix_matches(dir: &Path, job_id: &JobId) -> Result<Vec<ResolvedFile>, FetchError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !filename.starts_with(job_id.as_str()) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            // Removed between listing and stat
            Err(_) => continue,
        };
        if !metadata.is_file() {
            continue;
        }
        matches.push(ResolvedFile {
            path: entry.path(),
            filename,
            size_bytes: metadata.len(),
        });
    }

    Ok(matches)
}

/// Finds the output file of a job.
///
/// Among regular files whose name starts with the job id, picks the largest;
/// equal sizes fall back to the lexicographically greatest name. No match or
/// an empty winner is `ArtifactMissing`.
pub async fn resolve(dir: &Path, job_id: &JobId) -> Result<ResolvedFile, FetchError> {
    let candidates = prefix_matches(dir, job_id).await?;
    debug!(job_id = %job_id, candidates = candidates.len(), "Resolving job output");

    let missing = || FetchError::ArtifactMissing {
        job_id: job_id.to_string(),
        dir: dir.to_path_buf(),
    };

    let winner = candidates
        .into_iter()
        .max_by(|a, b| {
            a.size_bytes
                .cmp(&b.size_bytes)
                .then_with(|| a.filename.cmp(&b.filename))
        })
        .ok_or_else(missing)?;

    if winner.size_bytes == 0 {
        return Err(missing());
    }

    Ok(winner)
}

/// Deletes every file belonging to a job. Returns how many were removed.
///
/// Used on the failure path to drop partial downloads. Individual deletion
/// failures are logged and skipped.
pub async fn remove_job_files(dir: &Path, job_id: &JobId) -> usize {
    let candidates = match prefix_matches(dir, job_id).await {
        Ok(c) => c,
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "Failed to scan for partial files");
            return 0;
        }
    };

    let mut removed = 0;
    for file in candidates {
        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => {
                debug!(file = %file.filename, "Removed partial file");
                removed += 1;
            }
            Err(e) => warn!(file = %file.filename, error = %e, "Failed to remove partial file"),
        }
    }
    removed
}
