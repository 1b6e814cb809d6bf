//! Testing utilities and mock implementations for E2E tests.
//!
//! [`MockExecutor`] replaces the external downloader so the whole job
//! lifecycle and the HTTP surface can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use tubefetch_core::testing::{fixtures, MockExecutor, MockFailure};
//!
//! let executor = MockExecutor::new();
//! executor.set_stdout(fixtures::search_output(3)).await;
//! executor.set_failure(Some(MockFailure::Timeout)).await;
//! ```

mod mock_executor;

pub use mock_executor::{MockExecutor, MockFailure};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::Config;

    /// Config pointing at `artifact_dir`, with small limits suited to tests.
    pub fn config(artifact_dir: &Path) -> Config {
        let mut config = Config::default();
        config.storage.artifact_dir = artifact_dir.to_path_buf();
        config.fetcher.binary = "mock-downloader".into();
        config.fetcher.timeout_secs = 5;
        config.fetcher.max_concurrent_jobs = 2;
        config.storage.size_warning_mb = 1;
        config
    }

    /// A video id in the tool's 11-character shape.
    pub fn video_id(n: usize) -> String {
        format!("vid{:08}", n)
    }

    /// One search result line as printed by the tool.
    pub fn search_line(id: &str, title: &str, duration_secs: u64, views: u64) -> String {
        format!(
            "{}|||{}|||{}|||{}|||Test Channel|||https://i.ytimg.com/vi/{}/hqdefault.jpg",
            id, title, duration_secs, views, id
        )
    }

    /// `count` search result lines, each with 1.5M views.
    pub fn search_output(count: usize) -> String {
        (0..count)
            .map(|i| search_line(&video_id(i), &format!("Result {}", i), 212, 1_500_000))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A metadata dump with one muxed, one video-only and one audio-only format.
    pub fn info_json(id: &str, title: &str) -> String {
        serde_json::json!({
            "id": id,
            "title": title,
            "duration": 212,
            "uploader": "Test Channel",
            "thumbnail": format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", id),
            "view_count": 1500000,
            "formats": [
                {"format_id": "18", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 360},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1", "acodec": "none", "height": 1080},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a", "abr": 128.0}
            ]
        })
        .to_string()
    }
}
