// Helper functions shared by extractors, backends and the orchestrator

use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// Characters that are illegal in file names on at least one major platform
const ILLEGAL_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace characters that cannot appear in a file name with a hyphen
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Cut a failure reason down to `limit` characters for the item list
pub fn truncate_reason(reason: &str, limit: usize) -> String {
    reason.chars().take(limit).collect()
}

/// Numeric value leading a quality label ("1080p" -> 1080, "128kbps" -> 128)
pub fn label_number(label: &str) -> u32 {
    lazy_static::lazy_static! {
        static ref LABEL_NUMBER_RE: Regex = Regex::new(r"\d+").unwrap();
    }

    LABEL_NUMBER_RE
        .find(label)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, Error)]
pub enum RunError {
    /// Executable could not be found
    #[error("Failed to start {0}: not found")]
    NotFound(String),

    #[error("{0}")]
    Io(String),

    #[error("Timed out after {0}s")]
    TimedOut(u64),
}

/// Run command and capture its output, optionally with a timeout
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: Option<u64>,
) -> Result<std::process::Output, RunError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RunError::NotFound(program.to_string()),
            _ => RunError::Io(format!("Failed to start {}: {}", program, e)),
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| RunError::Io(format!("Failed to capture stdout from {}", program)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| RunError::Io(format!("Failed to capture stderr from {}", program)))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stdout: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stderr: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });

    let waited = match timeout_secs {
        Some(secs) => match timeout(Duration::from_secs(secs), child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(RunError::TimedOut(secs));
            }
        },
        None => child.wait().await,
    };

    let status = waited.map_err(|e| RunError::Io(format!("Failed to wait for {}: {}", program, e)))?;
    let stdout = stdout_task
        .await
        .map_err(|e| RunError::Io(format!("stdout task failed: {}", e)))?
        .map_err(RunError::Io)?;
    let stderr = stderr_task
        .await
        .map_err(|e| RunError::Io(format!("stderr task failed: {}", e)))?
        .map_err(RunError::Io)?;

    Ok(std::process::Output { status, stdout, stderr })
}

/// Last `max_lines` non-empty lines of process output
pub fn tail_lines(output: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(output);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
