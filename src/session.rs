//! Worker dispatch for the interactive loop
//!
//! The UI owns a [`Session`] and the receiving half of the event channel.
//! Fetches and batches run as spawned tasks and report back only through
//! [`UiEvent`]s, so the UI never blocks on network or subprocess work.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::DownloaderConfig;
use crate::downloader::batch::{run_batch, BatchRequest};
use crate::downloader::errors::DownloadError;
use crate::downloader::fetcher::fetch_details;
use crate::downloader::format_selector::is_selectable;
use crate::downloader::models::{FetchOutcome, JobResult, MediaMode};
use crate::downloader::orchestrator::Downloader;
use crate::events::{event_channel, EventSender, UiEvent};

pub struct Session {
    downloader: Arc<Downloader>,
    config: DownloaderConfig,
    events: EventSender,
}

/// A running batch
pub struct BatchHandle {
    pub join: JoinHandle<Vec<JobResult>>,
    cancel: CancellationToken,
}

impl BatchHandle {
    /// Stop after the current chunk; remaining items fail as cancelled
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Session {
    pub fn new(downloader: Arc<Downloader>, config: DownloaderConfig) -> (Self, UnboundedReceiver<UiEvent>) {
        let (events, rx) = event_channel();
        (
            Self {
                downloader,
                config,
                events,
            },
            rx,
        )
    }

    /// Session over the yt-dlp provider and FFmpeg muxer
    pub fn from_config(config: DownloaderConfig) -> Result<(Self, UnboundedReceiver<UiEvent>), DownloadError> {
        let downloader = Arc::new(Downloader::from_config(&config)?);
        Ok(Self::new(downloader, config))
    }

    /// Resolve `url` on a worker task; the outcome arrives as `UiEvent::FetchResult`
    pub fn spawn_fetch(&self, url: String) -> JoinHandle<()> {
        let downloader = Arc::clone(&self.downloader);
        let events = self.events.clone();

        tokio::spawn(async move {
            let outcome = fetch_details(downloader.provider(), &url).await;
            events.post(UiEvent::FetchResult(outcome));
        })
    }

    /// Build a batch request from a successful fetch and the user's selection
    pub fn batch_request(&self, outcome: &FetchOutcome, mode: MediaMode, quality: &str) -> Option<BatchRequest> {
        match outcome {
            FetchOutcome::Success {
                title,
                is_collection,
                items,
                ..
            } => Some(BatchRequest {
                items: items.clone(),
                collection_title: is_collection.then(|| title.clone()),
                mode,
                quality: quality.to_string(),
                download_dir: self.config.download_dir.clone(),
                reason_limit: self.config.status_reason_limit,
            }),
            FetchOutcome::Failure { .. } => None,
        }
    }

    /// Download every item of `request` on a worker task
    pub fn spawn_batch(&self, request: BatchRequest) -> Result<BatchHandle, DownloadError> {
        if request.items.is_empty() {
            return Err(DownloadError::InvalidSelection("Nothing to download".to_string()));
        }
        if !is_selectable(&request.quality) {
            return Err(DownloadError::InvalidSelection(format!(
                "Quality '{}' cannot be downloaded",
                request.quality
            )));
        }

        let downloader = Arc::clone(&self.downloader);
        let events = self.events.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move { run_batch(&downloader, &request, &events, &token).await });

        Ok(BatchHandle { join, cancel })
    }
}
