// Common data models for downloader

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What a single stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// Audio track only
    AudioOnly,
    /// Video track only, needs an audio stream merged in
    VideoOnly,
    /// Audio and video muxed in one transfer
    Progressive,
}

impl StreamKind {
    pub fn has_video(&self) -> bool {
        matches!(self, Self::VideoOnly | Self::Progressive)
    }
}

/// Download mode selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaMode {
    Audio,
    #[default]
    Video,
}

impl fmt::Display for MediaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "Audio"),
            Self::Video => write!(f, "Video"),
        }
    }
}

impl std::str::FromStr for MediaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(format!("Unknown mode: {}", other)),
        }
    }
}

/// One downloadable stream of a media item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub kind: StreamKind,
    /// "1080p" for video kinds, "128kbps" for audio
    pub quality: String,
    /// Total size in bytes (0 when the provider does not know)
    pub size: u64,
    /// Container extension reported by the provider (mp4, webm, m4a)
    pub container: String,
    /// Direct media URL
    pub source_url: String,
    /// Headers the provider requires for the transfer
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
}

/// A single video resolved from a URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Watch URL
    pub url: String,
    pub title: String,
    pub thumbnail_url: String,
    pub streams: Vec<StreamDescriptor>,
}

/// Result of resolving a URL through a provider
#[derive(Debug, Clone)]
pub enum Resolved {
    Single(MediaItem),
    Collection { title: String, items: Vec<MediaItem> },
}

/// Outcome of the metadata fetch, as handed to the UI
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success {
        title: String,
        is_collection: bool,
        items: Vec<MediaItem>,
        thumbnail_url: String,
        representative_streams: Vec<StreamDescriptor>,
    },
    Failure {
        message: String,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One item to download with the user's selection applied
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub item: MediaItem,
    pub mode: MediaMode,
    pub quality: String,
    pub destination: PathBuf,
    /// Ordering prefix for playlists, e.g. "01."
    pub filename_prefix: String,
}

/// Terminal state of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobResult {
    Completed,
    Failed(String),
}

impl JobResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Per-item status shown in the item list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Pending,
    Downloading,
    Merging,
    Completed,
    Failed(String),
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Downloading => write!(f, "Downloading..."),
            Self::Merging => write!(f, "Merging..."),
            Self::Completed => write!(f, "✔ Completed"),
            Self::Failed(reason) => write!(f, "❌ FAILED - {}", reason),
        }
    }
}

impl From<&JobResult> for ItemStatus {
    fn from(result: &JobResult) -> Self {
        match result {
            JobResult::Completed => Self::Completed,
            JobResult::Failed(reason) => Self::Failed(reason.clone()),
        }
    }
}
