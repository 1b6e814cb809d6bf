use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fetcher::FetchError;

/// `watch?...v=<id>` on the main, mobile or music host.
static WATCH_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.|m\.|music\.)?youtube\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .unwrap()
});

/// `/shorts/<id>`, `/embed/<id>`, `/live/<id>` and `/v/<id>` paths.
static PATH_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.|m\.|music\.)?youtube\.com/(?:shorts|embed|live|v)/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .unwrap()
});

/// `youtu.be/<id>` short links.
static SHORT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://)?youtu\.be/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)").unwrap()
});

/// Builds the canonical watch link for a video id.
pub fn canonical_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// A source after normalization: either a link or a tagged search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NormalizedSource {
    Url(String),
    Search(String),
}

impl NormalizedSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Search(s) => s,
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, Self::Search(_))
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl fmt::Display for NormalizedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::Search(term) => write!(f, "search:{}", term),
        }
    }
}

/// Normalizes a free-form source string.
///
/// Recognized video links are rewritten to the canonical watch link, other
/// `http(s)` links pass through untouched, and anything else is tagged as a
/// search term. Never fails; `normalize(normalize(x).as_str()) == normalize(x)`.
pub fn normalize(input: &str) -> NormalizedSource {
    let trimmed = input.trim();

    for pattern in [&*WATCH_LINK, &*PATH_LINK, &*SHORT_LINK] {
        if let Some(id) = pattern.captures(trimmed).and_then(|caps| caps.get(1)) {
            return NormalizedSource::Url(canonical_watch_url(id.as_str()));
        }
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        NormalizedSource::Url(trimmed.to_string())
    } else {
        NormalizedSource::Search(trimmed.to_string())
    }
}

/// Raw source fields as they arrive from a caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceInput {
    pub url: Option<String>,
    pub search: Option<String>,
}

impl SourceInput {
    pub fn new(url: Option<String>, search: Option<String>) -> Self {
        Self { url, search }
    }

    /// Picks the first non-blank field (`url` before `search`) and normalizes it.
    pub fn resolve(&self) -> Result<NormalizedSource, FetchError> {
        let raw = [self.url.as_deref(), self.search.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .ok_or_else(|| FetchError::invalid_request("url or search is required"))?;

        Ok(normalize(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn test_canonical_link_unchanged() {
        assert_eq!(normalize(CANONICAL), NormalizedSource::Url(CANONICAL.to_string()));
    }

    #[test]
    fn test_watch_link_variants() {
        for input in [
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            "http://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ&list=RDdQw4w9WgXcQ",
            "  https://www.youtube.com/watch?v=dQw4w9WgXcQ  ",
        ] {
            assert_eq!(normalize(input).as_str(), CANONICAL, "input: {}", input);
        }
    }

    #[test]
    fn test_path_links() {
        for input in [
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ?feature=share",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ",
        ] {
            assert_eq!(normalize(input).as_str(), CANONICAL, "input: {}", input);
        }
    }

    #[test]
    fn test_short_host_links() {
        for input in [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abcdef",
            "youtu.be/dQw4w9WgXcQ",
        ] {
            assert_eq!(normalize(input).as_str(), CANONICAL, "input: {}", input);
        }
    }

    #[test]
    fn test_id_must_be_exactly_eleven_chars() {
        // 12-char id is not a recognized link, passes through as a plain URL
        let input = "https://youtu.be/dQw4w9WgXcQQ";
        assert_eq!(normalize(input), NormalizedSource::Url(input.to_string()));
    }

    #[test]
    fn test_other_urls_pass_through() {
        let input = "https://vimeo.com/123456";
        assert_eq!(normalize(input), NormalizedSource::Url(input.to_string()));
    }

    #[test]
    fn test_free_text_is_search() {
        assert_eq!(
            normalize("  lofi hip hop  "),
            NormalizedSource::Search("lofi hip hop".to_string())
        );
    }

    #[test]
    fn test_idempotence() {
        for input in [
            CANONICAL,
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "http://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42",
            "https://example.com/video.mp4",
            "some search words",
        ] {
            let once = normalize(input);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "input: {}", input);
        }
    }

    #[test]
    fn test_source_input_prefers_url() {
        let input = SourceInput::new(
            Some("https://youtu.be/dQw4w9WgXcQ".to_string()),
            Some("ignored".to_string()),
        );
        assert_eq!(input.resolve().unwrap().as_str(), CANONICAL);
    }

    #[test]
    fn test_source_input_falls_back_to_search() {
        let input = SourceInput::new(Some("   ".to_string()), Some("cat videos".to_string()));
        assert_eq!(
            input.resolve().unwrap(),
            NormalizedSource::Search("cat videos".to_string())
        );
    }

    #[test]
    fn test_source_input_empty_is_invalid() {
        let err = SourceInput::new(None, Some(String::new())).resolve().unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest { .. }));
    }
}
