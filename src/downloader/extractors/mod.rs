// InfoExtractor module - video and playlist metadata through yt-dlp
//
// The CLI extractor runs the `yt-dlp` binary and turns its JSON output into
// typed media items; diagnostics turns its error output into short reasons.

mod cli;
mod diagnostics;

pub use cli::{parse_collection, parse_item, CliInfoExtractor};
pub use diagnostics::{describe_failure, diagnose_error, BlockingReason};
