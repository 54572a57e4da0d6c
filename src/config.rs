//! Runtime configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for metadata extraction, transfers and merging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// yt-dlp executable (name on PATH or absolute path)
    pub ytdlp_path: String,
    /// Muxer executable (name on PATH or absolute path)
    pub muxer_path: String,
    /// Default destination directory
    pub download_dir: PathBuf,
    /// Timeout for one metadata resolution, in seconds
    pub metadata_timeout_secs: u64,
    /// Extra attempts after a failed transfer
    pub transfer_retries: u32,
    /// Base delay for exponential backoff between attempts
    pub retry_base_delay_ms: u64,
    /// SOCKS5/HTTP proxy URL for metadata and transfers
    pub proxy: Option<String>,
    /// Failure reasons in the item list are cut to this many characters
    pub status_reason_limit: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            muxer_path: "ffmpeg".to_string(),
            download_dir: default_download_dir(),
            metadata_timeout_secs: 120,
            transfer_retries: 2,
            retry_base_delay_ms: 1000,
            proxy: None,
            status_reason_limit: 50,
        }
    }
}

impl DownloaderConfig {
    /// Defaults overridden by `YTDLP_PATH`, `FFMPEG_PATH`, `DOWNLOAD_DIR`, `YTDLP_PROXY`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = env_non_empty("YTDLP_PATH") {
            config.ytdlp_path = path;
        }
        if let Some(path) = env_non_empty("FFMPEG_PATH") {
            config.muxer_path = path;
        }
        if let Some(dir) = env_non_empty("DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }
        config.proxy = env_non_empty("YTDLP_PROXY");

        config
    }

    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    pub fn with_muxer_path(mut self, path: impl Into<String>) -> Self {
        self.muxer_path = path.into();
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_transfer_retries(mut self, retries: u32) -> Self {
        self.transfer_retries = retries;
        self
    }

    pub fn with_retry_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }
}

/// The user's Downloads folder, falling back to `~/Downloads`, then `.`
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DownloaderConfig::default();
        assert_eq!(config.muxer_path, "ffmpeg");
        assert_eq!(config.transfer_retries, 2);
        assert_eq!(config.status_reason_limit, 50);
        assert!(!config.download_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_builder_overrides() {
        let config = DownloaderConfig::default()
            .with_muxer_path("/opt/ffmpeg/bin/ffmpeg")
            .with_download_dir("/tmp/media")
            .with_transfer_retries(0)
            .with_proxy(Some("socks5://127.0.0.1:1080".to_string()));
        assert_eq!(config.muxer_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/media"));
        assert_eq!(config.transfer_retries, 0);
        assert!(config.proxy.is_some());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = DownloaderConfig::default().with_ytdlp_path("/usr/bin/yt-dlp");
        let json = serde_json::to_string(&config).unwrap();
        let back: DownloaderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ytdlp_path, "/usr/bin/yt-dlp");
    }
}
