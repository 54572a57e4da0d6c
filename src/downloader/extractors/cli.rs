// CLI InfoExtractor - resolves URLs through the native `yt-dlp` binary
//
// `--dump-json` prints one JSON document per video. For a playlist URL
// every entry comes out fully resolved (formats included), in playlist
// order, each carrying the playlist title.

use std::collections::HashMap;

use super::diagnostics::describe_failure;
use crate::config::DownloaderConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{MediaItem, Resolved, StreamDescriptor, StreamKind};
use crate::downloader::utils::{run_output_with_timeout, RunError};

/// CLI-based info extractor using yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: String,
    timeout_secs: u64,
    proxy: Option<String>,
}

impl CliInfoExtractor {
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            ytdlp_path: config.ytdlp_path.clone(),
            timeout_secs: config.metadata_timeout_secs,
            proxy: config.proxy.clone(),
        }
    }

    /// Build command arguments
    fn build_args(&self, url: &str, as_collection: bool) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            "30".to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ];

        if as_collection {
            args.push("--yes-playlist".to_string());
            args.push("--ignore-errors".to_string());
        } else {
            args.push("--no-playlist".to_string());
        }

        // Proxy
        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push(url.to_string());
        args
    }

    pub async fn resolve(&self, url: &str, as_collection: bool) -> Result<Resolved, DownloadError> {
        let args = self.build_args(url, as_collection);
        log::info!("[CliExtractor] {} {}", self.ytdlp_path, args.join(" "));

        let output = run_output_with_timeout(&self.ytdlp_path, args, Some(self.timeout_secs))
            .await
            .map_err(|e| match e {
                RunError::NotFound(_) => {
                    DownloadError::ToolNotFound(format!("{} binary not found", self.ytdlp_path))
                }
                other => DownloadError::FetchFailure(other.to_string()),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        // With --ignore-errors a playlist can exit non-zero yet still list good entries
        if !output.status.success() && (!as_collection || stdout.trim().is_empty()) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::warn!("[CliExtractor] yt-dlp failed: {}", stderr.trim());
            return Err(DownloadError::FetchFailure(describe_failure(&stderr)));
        }

        if as_collection {
            parse_collection(&stdout)
        } else {
            let line = stdout
                .lines()
                .find(|l| !l.trim().is_empty())
                .ok_or_else(|| DownloadError::ParseError("yt-dlp produced no output".to_string()))?;
            let json = parse_line(line)?;
            Ok(Resolved::Single(parse_item(&json)?))
        }
    }
}

fn parse_line(line: &str) -> Result<serde_json::Value, DownloadError> {
    serde_json::from_str(line).map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))
}

/// Parse `--dump-json` output of a playlist (one document per line)
pub fn parse_collection(stdout: &str) -> Result<Resolved, DownloadError> {
    let mut title: Option<String> = None;
    let mut items = Vec::new();

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let json = parse_line(line)?;
        if title.is_none() {
            title = json["playlist_title"]
                .as_str()
                .or_else(|| json["playlist"].as_str())
                .map(|s| s.to_string());
        }
        items.push(parse_item(&json)?);
    }

    Ok(Resolved::Collection {
        title: title.unwrap_or_else(|| "Playlist".to_string()),
        items,
    })
}

/// Parse one video document
pub fn parse_item(json: &serde_json::Value) -> Result<MediaItem, DownloadError> {
    let streams = parse_formats(json)?;

    let url = json["webpage_url"]
        .as_str()
        .or_else(|| json["original_url"].as_str())
        .unwrap_or("")
        .to_string();

    Ok(MediaItem {
        url,
        title: json["title"].as_str().unwrap_or("Unknown").to_string(),
        thumbnail_url: json["thumbnail"].as_str().unwrap_or("").to_string(),
        streams,
    })
}

fn parse_formats(json: &serde_json::Value) -> Result<Vec<StreamDescriptor>, DownloadError> {
    let formats_array = json["formats"]
        .as_array()
        .ok_or_else(|| DownloadError::ParseError("No formats array in JSON".to_string()))?;

    let mut streams = Vec::new();

    for f in formats_array {
        // Only plain HTTP(S) downloads can be transferred directly
        let protocol = f["protocol"].as_str().unwrap_or("https");
        if protocol != "https" && protocol != "http" {
            continue;
        }

        let Some(source_url) = f["url"].as_str() else {
            continue;
        };

        let has_video = f["vcodec"].as_str().map_or(false, |v| v != "none" && !v.is_empty());
        let has_audio = f["acodec"].as_str().map_or(false, |a| a != "none" && !a.is_empty());

        let kind = match (has_video, has_audio) {
            (true, true) => StreamKind::Progressive,
            (true, false) => StreamKind::VideoOnly,
            (false, true) => StreamKind::AudioOnly,
            // Storyboards and the like
            (false, false) => continue,
        };

        let quality = match kind {
            StreamKind::AudioOnly => f["abr"]
                .as_f64()
                .or_else(|| f["tbr"].as_f64())
                .filter(|b| *b > 0.0)
                .map(|b| format!("{}kbps", b.round() as u32)),
            _ => f["height"]
                .as_u64()
                .filter(|h| *h > 0)
                .map(|h| format!("{}p", h)),
        };
        let Some(quality) = quality else {
            continue;
        };

        let http_headers: HashMap<String, String> = f["http_headers"]
            .as_object()
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        streams.push(StreamDescriptor {
            kind,
            quality,
            size: f["filesize"]
                .as_u64()
                .or_else(|| f["filesize_approx"].as_u64())
                .unwrap_or(0),
            container: f["ext"].as_str().unwrap_or("").to_string(),
            source_url: source_url.to_string(),
            http_headers,
        });
    }

    Ok(streams)
}
