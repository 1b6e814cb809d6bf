//! Parsing of the downloader's search and metadata output.

use serde::Deserialize;
use tracing::debug;

use super::args::SEARCH_FIELD_DELIMITER;
use super::error::FetchError;
use super::types::{FormatCatalog, FormatInfo, MediaInfo, SearchHit};
use crate::format::{format_duration, format_size, format_views};
use crate::source::canonical_watch_url;

/// Placeholder the tool prints for missing template fields.
const MISSING: &str = "NA";

fn field(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != MISSING).then_some(value)
}

/// Parses one line per result, as printed with `SEARCH_PRINT_TEMPLATE`.
///
/// Fields are read from both ends so a title containing the delimiter still
/// parses. Lines with too few fields are skipped.
pub fn parse_search_output(stdout: &str) -> Vec<SearchHit> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(SEARCH_FIELD_DELIMITER).collect();
            if parts.len() < 6 {
                debug!("Skipping malformed search line: {}", line);
                return None;
            }
            let n = parts.len();
            let id = field(parts[0])?;
            let title = parts[1..n - 4].join(SEARCH_FIELD_DELIMITER);
            let duration = field(parts[n - 4]).and_then(|d| d.parse::<f64>().ok());
            let views = field(parts[n - 3]).and_then(|v| v.parse::<u64>().ok());

            Some(SearchHit {
                id: id.to_string(),
                title: field(&title).unwrap_or("Untitled").to_string(),
                url: canonical_watch_url(id),
                duration: format_duration(duration),
                views: format_views(views),
                uploader: field(parts[n - 2]).unwrap_or("Unknown").to_string(),
                thumbnail: field(parts[n - 1])
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id)),
            })
        })
        .collect()
}

/// Parses the JSON document dumped by the tool's metadata mode.
pub fn parse_info_output(output: &str) -> Result<MediaInfo, FetchError> {
    #[derive(Deserialize)]
    struct RawInfo {
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        duration: Option<f64>,
        #[serde(default)]
        uploader: Option<String>,
        #[serde(default)]
        channel: Option<String>,
        #[serde(default)]
        thumbnail: Option<String>,
        #[serde(default)]
        view_count: Option<u64>,
        #[serde(default)]
        formats: Vec<RawFormat>,
    }

    #[derive(Deserialize)]
    struct RawFormat {
        format_id: String,
        #[serde(default)]
        ext: Option<String>,
        #[serde(default)]
        vcodec: Option<String>,
        #[serde(default)]
        acodec: Option<String>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        fps: Option<f64>,
        #[serde(default)]
        tbr: Option<f64>,
        #[serde(default)]
        abr: Option<f64>,
        #[serde(default)]
        filesize: Option<u64>,
        #[serde(default)]
        filesize_approx: Option<u64>,
        #[serde(default)]
        format_note: Option<String>,
        #[serde(default)]
        resolution: Option<String>,
    }

    let raw: RawInfo = serde_json::from_str(output)
        .map_err(|e| FetchError::parse(format!("invalid metadata JSON: {}", e)))?;

    let has_codec = |codec: &Option<String>| codec.as_deref().is_some_and(|c| c != "none");

    let mut formats = FormatCatalog::default();
    for f in raw.formats {
        let has_video = has_codec(&f.vcodec);
        let has_audio = has_codec(&f.acodec);
        if !has_video && !has_audio {
            // Storyboards and other non-media entries
            continue;
        }

        let info = FormatInfo {
            format_id: f.format_id,
            ext: f.ext.unwrap_or_else(|| "unknown".to_string()),
            resolution: f.resolution,
            height: f.height,
            fps: f.fps,
            vcodec: f.vcodec.filter(|c| c != "none"),
            acodec: f.acodec.filter(|c| c != "none"),
            bitrate_kbps: f.abr.or(f.tbr),
            filesize: f.filesize.or(f.filesize_approx).map(format_size),
            note: f.format_note,
        };

        if has_video {
            formats.video.push(info);
        } else {
            formats.audio.push(info);
        }
    }

    formats
        .video
        .sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));
    formats.audio.sort_by(|a, b| {
        b.bitrate_kbps
            .unwrap_or(0.0)
            .total_cmp(&a.bitrate_kbps.unwrap_or(0.0))
    });

    Ok(MediaInfo {
        title: raw.title.unwrap_or_else(|| "Untitled".to_string()),
        duration: format_duration(raw.duration),
        duration_secs: raw.duration.map(|d| d.round() as u64),
        uploader: raw
            .uploader
            .or(raw.channel)
            .unwrap_or_else(|| "Unknown".to_string()),
        thumbnail: raw.thumbnail.unwrap_or_default(),
        views: format_views(raw.view_count),
        formats,
        id: raw.id,
    })
}
