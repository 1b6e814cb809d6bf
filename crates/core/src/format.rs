//! Human-readable formatting for durations, counts and sizes.

/// Formats seconds as `M:SS`, or `H:MM:SS` from one hour up.
///
/// Unknown durations (live streams, missing metadata) render as `N/A`.
pub fn format_duration(secs: Option<f64>) -> String {
    let secs = match secs {
        Some(s) if s.is_finite() && s >= 0.0 => s.round() as u64,
        _ => return "N/A".to_string(),
    };

    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Abbreviates a count with K/M/B suffixes and one decimal (`1500000` -> `1.5M`).
///
/// A trailing `.0` is dropped (`2000` -> `2K`).
pub fn format_count(count: u64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

    let value = count as f64;
    for (scale, suffix) in UNITS {
        if value >= scale {
            let scaled = format!("{:.1}", value / scale);
            let scaled = scaled.strip_suffix(".0").unwrap_or(&scaled);
            return format!("{}{}", scaled, suffix);
        }
    }
    count.to_string()
}

/// Formats an optional view count; unknown counts render as `N/A`.
pub fn format_views(views: Option<u64>) -> String {
    views.map(format_count).unwrap_or_else(|| "N/A".to_string())
}

/// Bytes to megabytes, rounded to two decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Formats a byte count as `12.3 MB` style text.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
