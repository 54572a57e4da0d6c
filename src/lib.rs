pub mod config;
pub mod downloader;
pub mod events;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::DownloaderConfig;
pub use downloader::{DownloadError, Downloader};
pub use events::{EventSender, UiEvent};
pub use session::{BatchHandle, Session};
