// Batch driver - downloads every fetched item in order, one at a time
//
// A failing item is recorded and reported; the batch always moves on to
// the next item and always ends with a BatchComplete event.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use super::errors::DownloadError;
use super::models::{DownloadJob, ItemStatus, JobResult, MediaItem, MediaMode};
use super::orchestrator::Downloader;
use super::progress::ProgressReporter;
use super::utils::{sanitize_filename, truncate_reason};
use crate::events::{EventSender, UiEvent};

/// The user's selection applied to a fetched item list
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub items: Vec<MediaItem>,
    /// Playlist title, names the sub-folder of a multi-item batch
    pub collection_title: Option<String>,
    pub mode: MediaMode,
    pub quality: String,
    pub download_dir: PathBuf,
    /// Failure reasons are cut to this many characters
    pub reason_limit: usize,
}

impl BatchRequest {
    pub fn is_multi_item(&self) -> bool {
        self.items.len() > 1
    }

    /// One job per item with destination and ordering prefix applied
    pub fn jobs(&self) -> Vec<DownloadJob> {
        let multi = self.is_multi_item();
        let destination = if multi {
            let title = self.collection_title.as_deref().unwrap_or("Playlist");
            self.download_dir.join(sanitize_filename(title))
        } else {
            self.download_dir.clone()
        };

        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| DownloadJob {
                item: item.clone(),
                mode: self.mode,
                quality: self.quality.clone(),
                destination: destination.clone(),
                filename_prefix: if multi {
                    format!("{:02}.", idx + 1)
                } else {
                    String::new()
                },
            })
            .collect()
    }
}

/// Run every job of `request` sequentially, posting status to `events`
pub async fn run_batch(
    downloader: &Downloader,
    request: &BatchRequest,
    events: &EventSender,
    cancel: &CancellationToken,
) -> Vec<JobResult> {
    let jobs = request.jobs();
    let total = jobs.len();
    let mut results = Vec::with_capacity(total);

    if let Some(first) = jobs.first() {
        log::info!(
            "[Batch] Downloading {} item(s) to: {}",
            total,
            first.destination.display()
        );
    }

    for (idx, job) in jobs.iter().enumerate() {
        let result = if cancel.is_cancelled() {
            JobResult::Failed(DownloadError::Cancelled.to_string())
        } else {
            events.post(UiEvent::ItemStatusChanged {
                index: idx,
                status: ItemStatus::Downloading,
            });
            log::info!("[Batch] Downloading video {}/{}: {}", idx + 1, total, job.item.title);

            let reporter = ProgressReporter::new(idx, events.clone());
            match downloader.download(job, &reporter, cancel).await {
                Ok(_) => JobResult::Completed,
                Err(e) => {
                    log::error!("[Batch] Download failed for video {}: {}", idx + 1, e);
                    events.post(UiEvent::Notification {
                        title: "Download Error".to_string(),
                        message: format!("Failed to download '{}'.\n\nError: {}", job.item.title, e),
                    });
                    JobResult::Failed(truncate_reason(&e.to_string(), request.reason_limit))
                }
            }
        };

        events.post(UiEvent::ItemStatusChanged {
            index: idx,
            status: ItemStatus::from(&result),
        });
        results.push(result);
    }

    let completed = results.iter().filter(|r| r.is_completed()).count();
    log::info!("[Batch] All downloads finished: {}/{} completed", completed, total);
    events.post(UiEvent::BatchComplete {
        results: results.clone(),
    });

    results
}
