// Failure diagnostics - classifies yt-dlp error output
//
// Used to turn raw stderr into a short, user-facing reason for the
// fetch failure message.

use serde::{Deserialize, Serialize};

/// Why the provider refused to resolve a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// URL is not recognized by any extractor
    UnsupportedUrl,

    /// Private video requiring authorization
    PrivateVideo,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Geographic restriction
    GeoBlocked,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Bot detection triggered
    BotDetection,

    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Network timeout or unreachable host
    NetworkTimeout,
}

impl BlockingReason {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedUrl => "Unsupported or invalid URL",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::AgeRestricted => "Age-restricted content",
            Self::GeoBlocked => "Not available in your country",
            Self::RateLimited => "Rate limited, try again later",
            Self::BotDetection => "Bot detection triggered",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::NetworkTimeout => "Network timeout",
        }
    }
}

/// Classify an error message; `None` when nothing recognizable is in it
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return Some(BlockingReason::UnsupportedUrl);
    }

    if lower.contains("private video")
        || lower.contains("video is private")
        || lower.contains("sign in if you've been granted access")
    {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("this video is no longer available")
        || lower.contains("video is unavailable")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("age-restricted") || lower.contains("sign in to confirm your age") {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("not available in your country") || lower.contains("blocked in your country") {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("confirm you're not a bot")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network unreachable")
        || lower.contains("name or service not known")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    None
}

/// Last `ERROR:` line of yt-dlp stderr, or the last non-empty line
pub fn error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Fetch failure message for yt-dlp stderr
pub fn describe_failure(stderr: &str) -> String {
    let line = error_line(stderr);
    match diagnose_error(stderr) {
        Some(reason) => format!("{} ({})", reason.description(), line),
        None => line,
    }
}
