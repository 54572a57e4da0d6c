// Seams between the pipeline and its external collaborators

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::errors::DownloadError;
use super::models::{Resolved, StreamDescriptor};

/// Metadata and transfer provider (yt-dlp + HTTP in production)
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Name of the provider (for logging)
    fn name(&self) -> &'static str;

    /// Resolve a URL into a single item or a collection of items
    async fn resolve(&self, url: &str, as_collection: bool) -> Result<Resolved, DownloadError>;

    /// Transfer one stream to `dest`, reporting progress as chunks arrive.
    /// Returns the number of bytes written.
    async fn transfer(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError>;
}

/// Receives progress for the transfers of one item.
///
/// Implementations must not fail and must be callable from worker tasks.
pub trait ProgressSink: Send + Sync {
    /// A new transfer is starting
    fn begin_transfer(&self, _stream: &StreamDescriptor) {}

    /// Cumulative progress of the current transfer
    fn on_progress(&self, total: u64, remaining: u64);

    /// Separate streams are being merged
    fn on_merge(&self) {}
}

/// Sink that drops everything
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _total: u64, _remaining: u64) {}
}

/// External stream-copy muxer
///
/// Fails with `MergeFailed` on a non-zero exit and `MuxerMissing` when the
/// executable cannot be started.
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError>;
}
