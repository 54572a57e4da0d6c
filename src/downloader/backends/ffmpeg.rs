// FFmpeg muxer - merges a video-only and an audio-only file without re-encoding

use std::path::Path;

use async_trait::async_trait;

use crate::downloader::errors::DownloadError;
use crate::downloader::traits::Muxer;
use crate::downloader::utils::{run_output_with_timeout, tail_lines, RunError};

pub struct FfmpegMuxer {
    program: String,
}

impl FfmpegMuxer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `-y -i <video> -i <audio> -c copy <output>`
    pub fn build_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-i".to_string(),
            audio.to_string_lossy().into_owned(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError> {
        let args = Self::build_args(video, audio, output);
        log::debug!("[FfmpegMuxer] {} {}", self.program, args.join(" "));

        match run_output_with_timeout(&self.program, args, None).await {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let details = tail_lines(&out.stderr, 5);
                Err(DownloadError::MergeFailed(if details.is_empty() {
                    out.status.to_string()
                } else {
                    format!("{}: {}", out.status, details)
                }))
            }
            Err(RunError::NotFound(_)) => Err(DownloadError::MuxerMissing),
            Err(e) => Err(DownloadError::MergeFailed(e.to_string())),
        }
    }
}
