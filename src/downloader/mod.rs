// Downloader module - fetch, select, transfer and merge

pub mod backends;
pub mod batch;
pub mod errors;
pub mod extractors;
pub mod fetcher;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod tools;
pub mod traits;
pub mod utils;

pub use batch::{run_batch, BatchRequest};
pub use errors::DownloadError;
pub use fetcher::{fetch_details, is_collection_url};
pub use format_selector::{quality_options, NOT_AVAILABLE};
pub use models::{
    DownloadJob, FetchOutcome, ItemStatus, JobResult, MediaItem, MediaMode, Resolved, StreamDescriptor, StreamKind,
};
pub use orchestrator::Downloader;
pub use progress::{ProgressReporter, ProgressSnapshot};
pub use tools::check_environment;
pub use traits::{MediaProvider, Muxer, NoProgress, ProgressSink};
pub use utils::sanitize_filename;
