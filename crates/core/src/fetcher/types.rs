//! Types for the fetcher module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::FetchError;
use crate::source::{NormalizedSource, SourceInput};

/// What the caller wants out of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl FromStr for MediaKind {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            other => Err(FetchError::invalid_request(format!(
                "unknown type '{}', expected 'video' or 'audio'",
                other
            ))),
        }
    }
}

/// Quality tier, or an explicit format id passed to the tool verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    Medium,
    High,
    #[default]
    Best,
    Format(String),
}

impl Quality {
    /// Height cap for video tiers; `None` means unconstrained.
    pub fn max_height(&self) -> Option<u32> {
        match self {
            Self::Low => Some(360),
            Self::Medium => Some(720),
            Self::High => Some(1080),
            Self::Best | Self::Format(_) => None,
        }
    }

    /// Value for the tool's audio quality flag (0 = best, 9 = worst).
    pub fn audio_quality(&self) -> &'static str {
        match self {
            Self::Low => "9",
            Self::Medium => "5",
            Self::High => "2",
            Self::Best | Self::Format(_) => "0",
        }
    }

    /// Returns the next tier down, used in oversize advice.
    pub fn lower(&self) -> Option<Quality> {
        match self {
            Self::Best => Some(Self::High),
            Self::High => Some(Self::Medium),
            Self::Medium => Some(Self::Low),
            Self::Low | Self::Format(_) => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Best => write!(f, "best"),
            Self::Format(id) => write!(f, "format:{}", id),
        }
    }
}

impl FromStr for Quality {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "360" | "360p" => Ok(Self::Low),
            "medium" | "720" | "720p" => Ok(Self::Medium),
            "high" | "1080" | "1080p" => Ok(Self::High),
            "best" | "highest" => Ok(Self::Best),
            other => Err(FetchError::invalid_request(format!(
                "unknown quality '{}', expected low, medium, high or best",
                other
            ))),
        }
    }
}

/// A validated download request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    source: NormalizedSource,
    kind: MediaKind,
    quality: Quality,
}

impl DownloadRequest {
    /// Builds a request, rejecting an empty source.
    pub fn new(
        source: NormalizedSource,
        kind: MediaKind,
        quality: Quality,
    ) -> Result<Self, FetchError> {
        if source.is_empty() {
            return Err(FetchError::invalid_request("source is empty"));
        }
        if let Quality::Format(id) = &quality {
            if id.trim().is_empty() {
                return Err(FetchError::invalid_request("formatId is empty"));
            }
        }
        Ok(Self {
            source,
            kind,
            quality,
        })
    }

    /// Builds a request from raw caller fields.
    ///
    /// A non-blank `format_id` takes precedence over `quality`. Missing
    /// `kind` defaults to video and missing `quality` to best.
    pub fn from_fields(
        source: &SourceInput,
        kind: Option<&str>,
        quality: Option<&str>,
        format_id: Option<&str>,
    ) -> Result<Self, FetchError> {
        let source = source.resolve()?;
        let kind = match kind {
            Some(k) if !k.trim().is_empty() => k.parse()?,
            _ => MediaKind::default(),
        };
        let quality = match (format_id, quality) {
            (Some(id), _) if !id.trim().is_empty() => Quality::Format(id.trim().to_string()),
            (_, Some(q)) if !q.trim().is_empty() => q.parse()?,
            _ => Quality::default(),
        };
        Self::new(source, kind, quality)
    }

    pub fn source(&self) -> &NormalizedSource {
        &self.source
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn quality(&self) -> &Quality {
        &self.quality
    }
}

/// A fully built invocation of the external tool.
///
/// Arguments are discrete elements; nothing here is ever joined into a shell
/// command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

/// Captured result of a successful (zero exit) tool run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
    pub elapsed: Duration,
}

/// One formatted search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub url: String,
    pub duration: String,
    pub views: String,
    pub uploader: String,
    pub thumbnail: String,
}

/// One downloadable format as reported by the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Formats split into video-bearing and audio-only subsets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatCatalog {
    pub video: Vec<FormatInfo>,
    pub audio: Vec<FormatInfo>,
}

/// Metadata for a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    pub duration: String,
    pub duration_secs: Option<u64>,
    pub uploader: String,
    pub thumbnail: String,
    pub views: String,
    pub formats: FormatCatalog,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_input(url: &str) -> SourceInput {
        SourceInput::new(Some(url.to_string()), None)
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!("low".parse::<Quality>().unwrap(), Quality::Low);
        assert_eq!("MEDIUM".parse::<Quality>().unwrap(), Quality::Medium);
        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::High);
        assert_eq!("best".parse::<Quality>().unwrap(), Quality::Best);
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn test_quality_heights() {
        assert_eq!(Quality::Low.max_height(), Some(360));
        assert_eq!(Quality::Medium.max_height(), Some(720));
        assert_eq!(Quality::High.max_height(), Some(1080));
        assert_eq!(Quality::Best.max_height(), None);
    }

    #[test]
    fn test_quality_lower() {
        assert_eq!(Quality::Best.lower(), Some(Quality::High));
        assert_eq!(Quality::Low.lower(), None);
        assert_eq!(Quality::Format("22".to_string()).lower(), None);
    }

    #[test]
    fn test_media_kind_parse() {
        assert_eq!("Audio".parse::<MediaKind>().unwrap(), MediaKind::Audio);
        assert!(matches!(
            "podcast".parse::<MediaKind>(),
            Err(FetchError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_request_defaults() {
        let request =
            DownloadRequest::from_fields(&url_input("https://youtu.be/dQw4w9WgXcQ"), None, None, None)
                .unwrap();
        assert_eq!(request.kind(), MediaKind::Video);
        assert_eq!(request.quality(), &Quality::Best);
        assert_eq!(
            request.source().as_str(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_format_id_takes_precedence() {
        let request = DownloadRequest::from_fields(
            &url_input("https://youtu.be/dQw4w9WgXcQ"),
            Some("video"),
            Some("low"),
            Some("137+140"),
        )
        .unwrap();
        assert_eq!(request.quality(), &Quality::Format("137+140".to_string()));
    }

    #[test]
    fn test_empty_source_rejected() {
        let err = DownloadRequest::from_fields(&SourceInput::default(), None, None, None)
            .unwrap_err();
        assert!(err.is_client_error());

        let err = DownloadRequest::new(
            NormalizedSource::Search(String::new()),
            MediaKind::Audio,
            Quality::Best,
        )
        .unwrap_err();
        assert!(err.is_client_error());
    }
}
