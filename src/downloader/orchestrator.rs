// Download orchestrator - picks streams for a job, transfers them and merges when needed

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::backends::{FfmpegMuxer, YtDlpProvider};
use super::errors::DownloadError;
use super::format_selector::{best_audio, select_audio, select_progressive, select_video_only};
use super::models::{DownloadJob, MediaMode, StreamDescriptor};
use super::traits::{MediaProvider, Muxer, ProgressSink};
use super::utils::sanitize_filename;
use crate::config::DownloaderConfig;

pub struct Downloader {
    provider: Arc<dyn MediaProvider>,
    muxer: Arc<dyn Muxer>,
}

/// Intermediate files of a merge. `remove_all` cleans up asynchronously;
/// anything still listed when the guard drops (early return, cancelled
/// future) is removed synchronously.
struct TempFiles {
    paths: Vec<PathBuf>,
}

fn log_cleanup(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => log::debug!("[Downloader] Cleaned up temporary file: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            let err = DownloadError::CleanupFailed {
                path: path.to_path_buf(),
                source: e,
            };
            log::warn!("[Downloader] {}", err);
        }
    }
}

impl TempFiles {
    async fn remove_all(&mut self) {
        for path in self.paths.drain(..) {
            let result = tokio::fs::remove_file(&path).await;
            log_cleanup(&path, result);
        }
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            log_cleanup(path, std::fs::remove_file(path));
        }
    }
}

impl Downloader {
    pub fn new(provider: Arc<dyn MediaProvider>, muxer: Arc<dyn Muxer>) -> Self {
        Self { provider, muxer }
    }

    /// yt-dlp provider and FFmpeg muxer from `config`
    pub fn from_config(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        Ok(Self::new(
            Arc::new(YtDlpProvider::new(config)?),
            Arc::new(FfmpegMuxer::new(config.muxer_path.clone())),
        ))
    }

    pub fn provider(&self) -> &dyn MediaProvider {
        self.provider.as_ref()
    }

    /// Download one job and return the path of the final file
    pub async fn download(
        &self,
        job: &DownloadJob,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        let file_title = sanitize_filename(&format!("{}{}", job.filename_prefix, job.item.title));

        tokio::fs::create_dir_all(&job.destination).await?;

        let result = match job.mode {
            MediaMode::Audio => {
                self.download_audio(job, &file_title, progress, cancel)
                    .await
            }
            MediaMode::Video => {
                self.download_video(job, &file_title, progress, cancel)
                    .await
            }
        };

        match &result {
            Ok(path) => log::info!("[Downloader] ✓ Successfully downloaded: {}", path.display()),
            Err(e) => log::error!("[Downloader] ✗ Download failed for {}: {}", file_title, e),
        }
        result
    }

    async fn download_audio(
        &self,
        job: &DownloadJob,
        file_title: &str,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        let stream = select_audio(&job.item.streams, &job.quality).ok_or(DownloadError::NoAudioStream)?;

        // Provider bytes are kept as-is under the .mp3 name
        let output = job.destination.join(format!("{}.mp3", file_title));
        log::info!("[Downloader] Downloading audio ({}): {}", stream.quality, file_title);
        self.transfer(stream, &output, progress, cancel).await?;
        Ok(output)
    }

    async fn download_video(
        &self,
        job: &DownloadJob,
        file_title: &str,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        let streams = &job.item.streams;
        let output = job.destination.join(format!("{}.mp4", file_title));

        if let Some(stream) = select_progressive(streams, &job.quality) {
            log::info!("[Downloader] Downloading progressive stream: {}", file_title);
            self.transfer(stream, &output, progress, cancel).await?;
            return Ok(output);
        }

        log::info!(
            "[Downloader] No progressive stream found. Downloading video and audio separately: {}",
            file_title
        );
        let (Some(video), Some(audio)) = (select_video_only(streams, &job.quality), best_audio(streams)) else {
            return Err(DownloadError::StreamsNotFound {
                quality: job.quality.clone(),
            });
        };
        if video.quality != job.quality {
            log::info!(
                "[Downloader] {} not available, falling back to {}",
                job.quality,
                video.quality
            );
        }

        let video_file = job.destination.join(format!("{}_video.mp4", file_title));
        let audio_file = job.destination.join(format!("{}_audio.mp4", file_title));
        let mut temp = TempFiles {
            paths: vec![video_file.clone(), audio_file.clone()],
        };

        let merged = async {
            self.transfer(video, &video_file, progress, cancel).await?;
            self.transfer(audio, &audio_file, progress, cancel).await?;

            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }

            log::info!("[Downloader] Merging video and audio: {}", file_title);
            progress.on_merge();
            self.muxer.merge(&video_file, &audio_file, &output).await
        }
        .await;

        temp.remove_all().await;
        merged.map(|()| output)
    }

    /// Provider transfer with local I/O errors reported as transfer failures
    async fn transfer(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        self.provider
            .transfer(stream, dest, progress, cancel)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                DownloadError::Io(io) => DownloadError::TransferFailed(io.to_string()),
                other => other,
            })
    }
}
