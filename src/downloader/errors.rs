// Error types for the download pipeline

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// URL could not be resolved (bad/unsupported URL, network error during metadata)
    #[error("Failed to fetch details: {0}")]
    FetchFailure(String),

    /// Playlist resolved to zero items
    #[error("Playlist is empty or invalid.")]
    EmptyCollection,

    #[error("No audio stream found.")]
    NoAudioStream,

    /// Adaptive path could not find a video-only or audio-only stream
    #[error("Could not find separate video/audio streams for {quality}.")]
    StreamsNotFound { quality: String },

    /// Muxer ran but exited with a non-zero status
    #[error("FFmpeg merge failed: {0}")]
    MergeFailed(String),

    #[error(
        "FFmpeg not found. Please ensure FFmpeg is installed and added to your system PATH. \
         Download from: https://ffmpeg.org/download.html"
    )]
    MuxerMissing,

    /// Network interruption, disk full, permission denied during a transfer
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Never surfaced to callers, only logged
    #[error("Failed to remove temporary file {}: {source}", path.display())]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// yt-dlp or another helper binary is not installed
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The requested mode/quality/item selection cannot start a batch
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Whether a transfer attempt that failed with this error is worth repeating
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransferFailed(_))
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        Self::TransferFailed(e.to_string())
    }
}
