//! Test doubles for the provider and muxer seams

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{MediaItem, Resolved, StreamDescriptor, StreamKind};
use crate::downloader::traits::{MediaProvider, Muxer, ProgressSink};

pub fn make_stream(kind: StreamKind, quality: &str, source: &str) -> StreamDescriptor {
    StreamDescriptor {
        kind,
        quality: quality.to_string(),
        size: 1000,
        container: "mp4".to_string(),
        source_url: format!("https://media.example/{}/{}", source, quality),
        http_headers: HashMap::new(),
    }
}

pub fn make_item(title: &str, streams: Vec<StreamDescriptor>) -> MediaItem {
    MediaItem {
        url: format!("https://www.youtube.com/watch?v={}", title),
        title: title.to_string(),
        thumbnail_url: String::new(),
        streams,
    }
}

/// Adaptive-only item: 1080p/720p video-only plus two audio bitrates
pub fn adaptive_item(title: &str) -> MediaItem {
    make_item(
        title,
        vec![
            make_stream(StreamKind::VideoOnly, "1080p", title),
            make_stream(StreamKind::VideoOnly, "720p", title),
            make_stream(StreamKind::AudioOnly, "128kbps", title),
            make_stream(StreamKind::AudioOnly, "160kbps", title),
        ],
    )
}

/// Provider that writes fake bytes and fails transfers of selected sources
#[derive(Default)]
pub struct MockProvider {
    pub resolved: Mutex<Option<Resolved>>,
    /// Transfers whose source URL contains one of these fail
    pub failing_sources: HashSet<String>,
    pub transfers: Mutex<Vec<(StreamDescriptor, PathBuf)>>,
}

impl MockProvider {
    pub fn failing(sources: &[&str]) -> Self {
        Self {
            failing_sources: sources.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn resolve(&self, _url: &str, _as_collection: bool) -> Result<Resolved, DownloadError> {
        self.resolved
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| DownloadError::FetchFailure("nothing to resolve".to_string()))
    }

    async fn transfer(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        self.transfers
            .lock()
            .unwrap()
            .push((stream.clone(), dest.to_path_buf()));

        progress.begin_transfer(stream);
        if self
            .failing_sources
            .iter()
            .any(|s| stream.source_url.contains(s.as_str()))
        {
            return Err(DownloadError::TransferFailed("connection reset".to_string()));
        }

        std::fs::write(dest, stream.source_url.as_bytes())?;
        progress.on_progress(stream.size, stream.size / 2);
        progress.on_progress(stream.size, 0);
        Ok(stream.size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxBehavior {
    Succeed,
    Fail,
    Missing,
}

/// Muxer that records its calls and whether the inputs existed at the time
pub struct RecordingMuxer {
    behavior: MuxBehavior,
    pub calls: Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>,
    pub inputs_existed: Mutex<Vec<bool>>,
}

impl RecordingMuxer {
    pub fn new(behavior: MuxBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            inputs_existed: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Muxer for RecordingMuxer {
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError> {
        self.calls.lock().unwrap().push((
            video.to_path_buf(),
            audio.to_path_buf(),
            output.to_path_buf(),
        ));
        self.inputs_existed
            .lock()
            .unwrap()
            .push(video.exists() && audio.exists());

        match self.behavior {
            MuxBehavior::Succeed => {
                std::fs::write(output, b"merged")?;
                Ok(())
            }
            MuxBehavior::Fail => Err(DownloadError::MergeFailed("exit status: 1".to_string())),
            MuxBehavior::Missing => Err(DownloadError::MuxerMissing),
        }
    }
}
