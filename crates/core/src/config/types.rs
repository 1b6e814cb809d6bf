use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::artifact::CleanupPolicy;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Absolute base URL used when building retrieval links
    /// (e.g. "https://media.example.org"). Relative links when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// External fetching tool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Path or name of the downloader executable.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Wall-clock limit for a download job in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Wall-clock limit for a search invocation in seconds.
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,
    /// Wall-clock limit for a metadata invocation in seconds.
    #[serde(default = "default_info_timeout")]
    pub info_timeout_secs: u64,
    /// Captured bytes kept per output stream; the rest is discarded.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Downloads allowed to run the external tool at the same time.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// Value passed to the tool's concurrent fragment flag.
    #[serde(default = "default_concurrent_fragments")]
    pub concurrent_fragments: u32,
    /// Upper bound for the `limit` parameter of searches.
    #[serde(default = "default_max_search_results")]
    pub max_search_results: u32,
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout() -> u64 {
    120
}

fn default_search_timeout() -> u64 {
    30
}

fn default_info_timeout() -> u64 {
    45
}

fn default_max_output_bytes() -> usize {
    64 * 1024
}

fn default_max_concurrent_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_concurrent_fragments() -> u32 {
    4
}

fn default_max_search_results() -> u32 {
    25
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout_secs: default_timeout(),
            search_timeout_secs: default_search_timeout(),
            info_timeout_secs: default_info_timeout(),
            max_output_bytes: default_max_output_bytes(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            concurrent_fragments: default_concurrent_fragments(),
            max_search_results: default_max_search_results(),
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Artifact storage and cleanup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Minimum file age in seconds before the sweeper may delete it.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Artifacts above this size are flagged as oversized in responses.
    #[serde(default = "default_size_warning_mb")]
    pub size_warning_mb: u64,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_ttl() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval() -> u64 {
    600 // 10 minutes
}

fn default_size_warning_mb() -> u64 {
    50
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            size_warning_mb: default_size_warning_mb(),
        }
    }
}

impl StorageConfig {
    pub fn cleanup_policy(&self) -> CleanupPolicy {
        CleanupPolicy {
            ttl: Duration::from_secs(self.ttl_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }

    pub fn size_warning_bytes(&self) -> u64 {
        self.size_warning_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.fetcher.binary, PathBuf::from("yt-dlp"));
        assert_eq!(config.fetcher.timeout_secs, 120);
        assert_eq!(config.storage.ttl_secs, 3600);
        assert_eq!(config.storage.artifact_dir, PathBuf::from("downloads"));
        assert!(config.fetcher.max_concurrent_jobs >= 1);
    }

    #[test]
    fn test_deserialize_custom_sections() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
public_base_url = "https://media.example.org"

[fetcher]
binary = "/usr/local/bin/yt-dlp"
timeout_secs = 90
max_concurrent_jobs = 2

[storage]
artifact_dir = "/var/lib/tubefetch"
ttl_secs = 7200
sweep_interval_secs = 300
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.server.public_base_url.as_deref(),
            Some("https://media.example.org")
        );
        assert_eq!(config.fetcher.binary, PathBuf::from("/usr/local/bin/yt-dlp"));
        assert_eq!(config.fetcher.timeout_secs, 90);
        assert_eq!(config.fetcher.max_concurrent_jobs, 2);
        // Unset fields still fall back to defaults
        assert_eq!(config.fetcher.concurrent_fragments, 4);
        assert_eq!(config.storage.ttl_secs, 7200);
        assert_eq!(config.storage.size_warning_mb, 50);
    }

    #[test]
    fn test_cleanup_policy_from_storage() {
        let storage = StorageConfig {
            ttl_secs: 1800,
            sweep_interval_secs: 120,
            ..Default::default()
        };
        let policy = storage.cleanup_policy();
        assert_eq!(policy.ttl, Duration::from_secs(1800));
        assert_eq!(policy.sweep_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_size_warning_bytes() {
        let storage = StorageConfig::default();
        assert_eq!(storage.size_warning_bytes(), 50 * 1024 * 1024);

        let huge = StorageConfig {
            size_warning_mb: u64::MAX,
            ..Default::default()
        };
        assert_eq!(huge.size_warning_bytes(), u64::MAX);
    }
}
