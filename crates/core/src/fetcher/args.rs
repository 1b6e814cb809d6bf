//! Translation of validated requests into tool invocations.

use std::path::Path;
use std::time::Duration;

use super::error::FetchError;
use super::types::{DownloadRequest, InvocationPlan, MediaKind, Quality};
use crate::config::FetcherConfig;
use crate::jobs::JobId;
use crate::source::NormalizedSource;

/// Characters removed from any caller-supplied text before it reaches argv.
pub const BLOCKED_CHARS: &[char] = &[
    ';', '&', '|', '`', '$', '(', ')', '<', '>', '\\', '\'', '"', '\n', '\r', '\0',
];

/// Separator between fields of one search result line.
pub const SEARCH_FIELD_DELIMITER: &str = "|||";

/// Field order of a search result line.
pub const SEARCH_PRINT_TEMPLATE: &str =
    "%(id)s|||%(title)s|||%(duration)s|||%(view_count)s|||%(uploader)s|||%(thumbnail)s";

/// Removes shell metacharacters, keeping every other character in order.
///
/// The executor never goes through a shell, so this only matters if some
/// future code path does.
pub fn sanitize(input: &str) -> String {
    input.chars().filter(|c| !BLOCKED_CHARS.contains(c)).collect()
}

/// Builds argument vectors for the external tool.
#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    config: FetcherConfig,
}

impl ArgumentBuilder {
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Fixed robustness flags. Not caller controlled.
    fn network_args(&self) -> Vec<String> {
        vec![
            "--force-ipv4".to_string(),
            "--geo-bypass".to_string(),
            "--no-playlist".to_string(),
            "--hls-prefer-native".to_string(),
            "--concurrent-fragments".to_string(),
            self.config.concurrent_fragments.to_string(),
            "--no-progress".to_string(),
            "--no-warnings".to_string(),
            // File age drives expiry, so keep mtime at write time
            "--no-mtime".to_string(),
        ]
    }

    /// Format selection for a request.
    fn format_args(kind: MediaKind, quality: &Quality) -> Vec<String> {
        let mut args = Vec::new();

        match (kind, quality) {
            (_, Quality::Format(id)) => {
                args.extend(["-f".to_string(), id.clone()]);
            }
            (MediaKind::Video, quality) => {
                let selector = match quality.max_height() {
                    Some(h) => format!(
                        "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
                        h = h
                    ),
                    None => "bestvideo+bestaudio/best".to_string(),
                };
                args.extend(["-f".to_string(), selector]);
            }
            (MediaKind::Audio, _) => {}
        }

        if kind == MediaKind::Audio {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                "mp3".to_string(),
                "--audio-quality".to_string(),
                quality.audio_quality().to_string(),
            ]);
        }

        args
    }

    /// Positional source argument, sanitized.
    fn source_arg(source: &NormalizedSource, search_count: u32) -> Result<String, FetchError> {
        let cleaned = sanitize(source.as_str());
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(FetchError::invalid_request("source is empty after sanitization"));
        }

        Ok(match source {
            NormalizedSource::Url(_) => cleaned.to_string(),
            NormalizedSource::Search(_) => format!("ytsearch{}:{}", search_count, cleaned),
        })
    }

    fn plan(&self, args: Vec<String>, timeout: Duration) -> InvocationPlan {
        InvocationPlan {
            program: self.config.binary.clone(),
            args,
            timeout,
            max_output_bytes: self.config.max_output_bytes,
        }
    }

    /// Builds the download invocation for a job.
    ///
    /// Output goes to `<output_dir>/<job_id>.<ext>`; the extension is left to
    /// the tool since container negotiation depends on the chosen format.
    pub fn download_plan(
        &self,
        job_id: &JobId,
        request: &DownloadRequest,
        output_dir: &Path,
    ) -> Result<InvocationPlan, FetchError> {
        let source = Self::source_arg(request.source(), 1)?;

        let mut args = self.network_args();

        let template = output_dir.join(format!("{}.%(ext)s", job_id));
        args.extend(["-o".to_string(), template.to_string_lossy().to_string()]);

        args.extend(Self::format_args(request.kind(), request.quality()));

        // Everything after "--" is positional, even if it starts with '-'
        args.push("--".to_string());
        args.push(source);

        Ok(self.plan(args, self.config.timeout()))
    }

    /// Builds a search invocation printing one delimited line per result.
    pub fn search_plan(&self, query: &str, limit: u32) -> Result<InvocationPlan, FetchError> {
        let limit = limit.clamp(1, self.config.max_search_results);
        let source = Self::source_arg(&NormalizedSource::Search(query.to_string()), limit)?;

        let args = vec![
            "--force-ipv4".to_string(),
            "--geo-bypass".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
            "--print".to_string(),
            SEARCH_PRINT_TEMPLATE.to_string(),
            "--".to_string(),
            source,
        ];

        Ok(self.plan(args, Duration::from_secs(self.config.search_timeout_secs)))
    }

    /// Builds a metadata invocation that dumps one JSON document.
    pub fn info_plan(&self, url: &str) -> Result<InvocationPlan, FetchError> {
        let source = match crate::source::normalize(url) {
            NormalizedSource::Url(url) => Self::source_arg(&NormalizedSource::Url(url), 1)?,
            NormalizedSource::Search(_) => {
                return Err(FetchError::invalid_request("url must be an http(s) link"));
            }
        };

        let args = vec![
            "--force-ipv4".to_string(),
            "--geo-bypass".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "-J".to_string(),
            "--".to_string(),
            source,
        ];

        // Metadata dumps can be large
        let mut plan = self.plan(args, Duration::from_secs(self.config.info_timeout_secs));
        plan.max_output_bytes = plan.max_output_bytes.max(8 * 1024 * 1024);
        Ok(plan)
    }
}
