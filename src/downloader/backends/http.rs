// HTTP transfer backend
//
// Streams a format URL to disk in byte ranges (media hosts throttle long
// single requests). The provider's size is only a hint: the exact total
// comes from the first `Content-Range`, and a server that ignores ranges
// gets one plain streamed GET. Network errors are retried with exponential
// backoff, resuming ranged transfers from the last written byte; local I/O
// errors are not retried.

use std::io::SeekFrom;
use std::path::Path;
use std::time::Duration;

use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, Response, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::config::DownloaderConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::StreamDescriptor;
use crate::downloader::traits::ProgressSink;

/// Default size of one range request
pub const RANGE_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Upper bound for a single backoff pause
const MAX_RETRY_DELAY_MS: u64 = 60_000;

pub struct HttpTransfer {
    client: Client,
    retries: u32,
    base_delay_ms: u64,
    range_chunk_size: u64,
}

struct TransferState {
    written: u64,
    /// Size hint until `exact` is set
    total: u64,
    exact: bool,
    ranged: bool,
}

/// Delay before retry number `attempt` (1-based), doubling each time
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_RETRY_DELAY_MS))
}

/// `bytes <start>-<end>/<total>`; the total is `None` for `*`
fn parse_content_range(value: &str) -> Option<(u64, u64, Option<u64>)> {
    let (range, total) = value.trim().strip_prefix("bytes ")?.split_once('/')?;
    let (start, end) = range.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?, total.trim().parse().ok()))
}

impl HttpTransfer {
    pub fn new(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .tcp_keepalive(Duration::from_secs(60));

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| DownloadError::TransferFailed(format!("Invalid proxy URL {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            retries: config.transfer_retries,
            base_delay_ms: config.retry_base_delay_ms,
            range_chunk_size: RANGE_CHUNK_SIZE,
        })
    }

    pub fn with_range_chunk_size(mut self, size: u64) -> Self {
        self.range_chunk_size = size.max(1);
        self
    }

    /// Transfer `stream` to `dest`; a partial file is removed on failure
    pub async fn download(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        progress.begin_transfer(stream);

        let result = self.download_inner(stream, dest, progress, cancel).await;

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(dest).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("[HttpTransfer] Failed to remove partial file {}: {}", dest.display(), e);
                }
            }
        }
        result
    }

    async fn download_inner(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let mut file = File::create(dest).await?;
        let mut state = TransferState {
            written: 0,
            total: stream.size,
            exact: false,
            ranged: true,
        };
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }

            match self.fetch_next(stream, &mut file, &mut state, progress, cancel).await {
                Ok(true) => break,
                Ok(false) => attempt = 0,
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.base_delay_ms, attempt);
                    log::warn!(
                        "[HttpTransfer] Network error (attempt {}): {}. Retrying in {}ms...",
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }

                    // Without ranges there is nothing to resume from
                    if !state.ranged {
                        state.written = 0;
                        file.set_len(0).await?;
                        file.seek(SeekFrom::Start(0)).await?;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        file.flush().await?;
        Ok(state.written)
    }

    /// Fetch the next range (or the whole body). Ok(true) once the file is complete.
    async fn fetch_next(
        &self,
        stream: &StreamDescriptor,
        file: &mut File,
        state: &mut TransferState,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<bool, DownloadError> {
        let mut request = self.client.get(&stream.source_url);
        for (name, value) in &stream.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut requested = None;
        if state.ranged {
            let mut end = state.written + self.range_chunk_size - 1;
            if state.exact {
                end = end.min(state.total.saturating_sub(1));
            }
            requested = Some(end - state.written + 1);
            request = request.header(RANGE, format!("bytes={}-{}", state.written, end));
        }

        let response = request.send().await?;

        // Unknown total that was an exact multiple of the chunk size
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE && state.written > 0 && !state.exact {
            state.total = state.written;
            return Ok(true);
        }
        let response = response.error_for_status()?;

        if state.ranged {
            if response.status() == StatusCode::PARTIAL_CONTENT {
                Self::accept_range(&response, state)?;
            } else if state.written > 0 {
                return Err(DownloadError::TransferFailed(
                    "Server ignored range request mid-transfer".to_string(),
                ));
            } else {
                log::debug!("[HttpTransfer] Range not honored, streaming whole body");
                state.ranged = false;
            }
        }
        if !state.ranged {
            if let Some(len) = response.content_length().filter(|len| *len > 0) {
                state.total = len;
                state.exact = true;
            }
        }

        let received = Self::write_body(response, file, state, progress, cancel).await?;

        if !state.ranged {
            return Ok(true);
        }
        if state.exact {
            if state.written >= state.total {
                return Ok(true);
            }
            if received == 0 {
                return Err(DownloadError::TransferFailed("Empty range response".to_string()));
            }
            return Ok(false);
        }
        // Without a known total a short range marks the end
        Ok(requested.map_or(true, |len| received < len))
    }

    /// Take the exact total from a 206 and check it continues the file
    fn accept_range(response: &Response, state: &mut TransferState) -> Result<(), DownloadError> {
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);

        if let Some((start, _, total)) = content_range {
            if start != state.written {
                return Err(DownloadError::TransferFailed(format!(
                    "Server returned range starting at {}, expected {}",
                    start, state.written
                )));
            }
            if let Some(total) = total {
                if !state.exact && total != state.total {
                    log::debug!("[HttpTransfer] Size hint {} corrected to {}", state.total, total);
                }
                state.total = total;
                state.exact = true;
            }
        }
        Ok(())
    }

    async fn write_body(
        mut response: Response,
        file: &mut File,
        state: &mut TransferState,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let mut received = 0u64;
        while let Some(chunk) = response.chunk().await? {
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
            state.written += chunk.len() as u64;

            let total = state.total.max(state.written);
            progress.on_progress(total, total - state.written);
        }
        Ok(received)
    }
}
