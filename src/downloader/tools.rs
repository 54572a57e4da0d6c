use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::DownloaderConfig;
use crate::downloader::utils::run_output_with_timeout;

/// Seconds to wait for a `--version` style probe
const VERSION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

pub struct ToolManager {
    ytdlp_program: String,
    ffmpeg_program: String,
}

impl ToolManager {
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            ytdlp_program: config.ytdlp_path.clone(),
            ffmpeg_program: config.muxer_path.clone(),
        }
    }

    pub async fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let program = match tool_type {
            ToolType::YtDlp => &self.ytdlp_program,
            ToolType::Ffmpeg => &self.ffmpeg_program,
        };
        let path = Self::detect_tool(program);
        let version = match &path {
            Some(p) => Self::get_version(p, tool_type).await,
            None => None,
        };

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version,
            is_available: path.is_some(),
            path: path.map(|p| p.to_string_lossy().into_owned()),
        }
    }

    pub async fn get_all_tools(&self) -> Vec<ToolInfo> {
        vec![
            self.get_tool_info(ToolType::YtDlp).await,
            self.get_tool_info(ToolType::Ffmpeg).await,
        ]
    }

    fn detect_tool(program: &str) -> Option<PathBuf> {
        // 1. PATH (or the explicit path when one is configured)
        if let Ok(path) = which::which(program) {
            return Some(path);
        }

        // 2. Common install locations missing from a GUI app's PATH
        let common_dirs = ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];
        common_dirs
            .iter()
            .map(|dir| PathBuf::from(dir).join(program))
            .find(|candidate| candidate.is_file())
    }

    async fn get_version(path: &Path, tool_type: ToolType) -> Option<String> {
        let output = run_output_with_timeout(
            &path.to_string_lossy(),
            vec![tool_type.version_arg().to_string()],
            Some(VERSION_TIMEOUT_SECS),
        )
        .await
        .ok()?;

        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
    }
}

/// Log which external tools are available. Returns whether the muxer was found.
pub async fn check_environment(config: &DownloaderConfig) -> bool {
    let manager = ToolManager::new(config);
    log::info!("[Tools] Current working directory: {:?}", std::env::current_dir().ok());

    let tools = manager.get_all_tools().await;
    for tool in &tools {
        match (&tool.path, &tool.version) {
            (Some(path), version) => log::info!(
                "[Tools] ✅ Found {} at: {} ({})",
                tool.name,
                path,
                version.as_deref().unwrap_or("unknown version")
            ),
            (None, _) => match tool.tool_type {
                ToolType::Ffmpeg => log::warn!(
                    "[Tools] ⚠️ FFmpeg not found in PATH. Audio and progressive video downloads still work; \
                     merged downloads will fail. Install FFmpeg: https://ffmpeg.org/download.html"
                ),
                ToolType::YtDlp => log::warn!(
                    "[Tools] ⚠️ yt-dlp not found. Fetching details will fail until it is installed."
                ),
            },
        }
    }

    tools
        .iter()
        .any(|t| t.tool_type == ToolType::Ffmpeg && t.is_available)
}
