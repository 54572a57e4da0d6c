// Production backends: yt-dlp metadata, HTTP transfers, FFmpeg merging

mod ffmpeg;
mod http;

pub use ffmpeg::FfmpegMuxer;
pub use http::{HttpTransfer, RANGE_CHUNK_SIZE};

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::errors::DownloadError;
use super::extractors::CliInfoExtractor;
use super::models::{Resolved, StreamDescriptor};
use super::traits::{MediaProvider, ProgressSink};
use crate::config::DownloaderConfig;

/// Provider backed by the yt-dlp binary for metadata and reqwest for transfers
pub struct YtDlpProvider {
    extractor: CliInfoExtractor,
    http: HttpTransfer,
}

impl YtDlpProvider {
    pub fn new(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        Ok(Self {
            extractor: CliInfoExtractor::new(config),
            http: HttpTransfer::new(config)?,
        })
    }
}

#[async_trait]
impl MediaProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve(&self, url: &str, as_collection: bool) -> Result<Resolved, DownloadError> {
        self.extractor.resolve(url, as_collection).await
    }

    async fn transfer(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        self.http.download(stream, dest, progress, cancel).await
    }
}
