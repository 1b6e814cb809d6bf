//! Artifact registry over the artifact directory.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::types::{Artifact, CleanupPolicy, ResolvedFile, StoreStats};

fn expiry(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| created_at.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Owns the artifact directory and remembers what jobs produced.
///
/// The directory is the source of truth: lookups fall back to disk so
/// artifacts written before a restart stay retrievable until swept.
pub struct ArtifactStore {
    dir: PathBuf,
    policy: CleanupPolicy,
    registry: RwLock<HashMap<String, Artifact>>,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, policy: CleanupPolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
            registry: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> CleanupPolicy {
        self.policy
    }

    /// Creates the artifact directory if needed.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        info!(dir = %self.dir.display(), "Artifact directory ready");
        Ok(())
    }

    /// Records a resolved file as a retrievable artifact.
    pub async fn register(&self, resolved: ResolvedFile) -> Artifact {
        let created_at = Utc::now();
        let artifact = Artifact {
            expires_at: expiry(created_at, self.policy.ttl),
            filename: resolved.filename,
            path: resolved.path,
            size_bytes: resolved.size_bytes,
            created_at,
        };

        debug!(file = %artifact.filename, size = artifact.size_bytes, "Registered artifact");
        self.registry
            .write()
            .await
            .insert(artifact.filename.clone(), artifact.clone());
        artifact
    }

    /// Maps a caller-supplied filename to a path inside the artifact directory.
    ///
    /// Returns `None` for anything that is not a plain file name: separators,
    /// parent references, hidden names, NUL bytes.
    pub fn path_for(&self, filename: &str) -> Option<PathBuf> {
        let plain = !filename.is_empty()
            && !filename.starts_with('.')
            && !filename.contains("..")
            && !filename.contains(['/', '\\', '\0']);
        plain.then(|| self.dir.join(filename))
    }

    /// Looks up an artifact by filename.
    ///
    /// Never deletes. A registry entry whose file is gone is forgotten; a
    /// file on disk that is not registered is reported with its mtime as
    /// creation time.
    pub async fn get(&self, filename: &str) -> std::io::Result<Option<Artifact>> {
        let Some(path) = self.path_for(filename) else {
            return Ok(None);
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.forget(filename).await;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if let Some(artifact) = self.registry.read().await.get(filename) {
            return Ok(Some(artifact.clone()));
        }

        let created_at: DateTime<Utc> = metadata.modified()?.into();
        Ok(Some(Artifact {
            filename: filename.to_string(),
            path,
            size_bytes: metadata.len(),
            created_at,
            expires_at: expiry(created_at, self.policy.ttl),
        }))
    }

    /// Drops a registry entry. Leaves the file alone.
    pub async fn forget(&self, filename: &str) {
        self.registry.write().await.remove(filename);
    }

    /// Creation times of registered artifacts, keyed by filename.
    pub async fn registered_times(&self) -> HashMap<String, DateTime<Utc>> {
        self.registry
            .read()
            .await
            .iter()
            .map(|(name, artifact)| (name.clone(), artifact.created_at))
            .collect()
    }

    /// Number of registered artifacts.
    pub async fn registered(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Counts regular files in the directory and their total size.
    pub async fn stats(&self) -> std::io::Result<StoreStats> {
        let mut stats = StoreStats::default();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stats),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            if let Ok(metadata) = entry.metadata().await {
                if metadata.is_file() {
                    stats.file_count += 1;
                    stats.total_bytes += metadata.len();
                }
            }
        }
        Ok(stats)
    }

    /// Lists up to `limit` file names in the directory, sorted.
    pub async fn list_files(&self, limit: usize) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        names.truncate(limit);
        Ok(names)
    }
}
