// FormatSelector - quality enumeration and stream selection
//
// Turns the stream list of an item into UI quality labels and maps a
// chosen label back to concrete streams:
// - Audio: distinct bitrates, highest first
// - Video: distinct resolutions over progressive + video-only streams
// - Exact label match first, otherwise the best stream of the kind

use std::collections::BTreeMap;

use super::models::{MediaMode, StreamDescriptor, StreamKind};
use super::utils::label_number;

/// Sentinel shown when a mode has no streams at all
pub const NOT_AVAILABLE: &str = "Not Available";

/// Whether a label can be handed to the orchestrator
pub fn is_selectable(label: &str) -> bool {
    label != NOT_AVAILABLE && !label.trim().is_empty()
}

/// Build quality labels for `mode`, highest first
pub fn quality_options(streams: &[StreamDescriptor], mode: MediaMode) -> Vec<String> {
    // Keyed by numeric value: two labels normalizing to the same number collapse
    let mut by_value: BTreeMap<u32, &str> = BTreeMap::new();

    for stream in streams.iter().filter(|s| matches_mode(s.kind, mode)) {
        if stream.quality.is_empty() {
            continue;
        }
        by_value
            .entry(label_number(&stream.quality))
            .or_insert(stream.quality.as_str());
    }

    if by_value.is_empty() {
        return vec![NOT_AVAILABLE.to_string()];
    }

    by_value.values().rev().map(|label| label.to_string()).collect()
}

fn matches_mode(kind: StreamKind, mode: MediaMode) -> bool {
    match mode {
        MediaMode::Audio => kind == StreamKind::AudioOnly,
        MediaMode::Video => kind.has_video(),
    }
}

/// Pick the audio-only stream for `quality`, falling back to the highest bitrate
pub fn select_audio<'a>(streams: &'a [StreamDescriptor], quality: &str) -> Option<&'a StreamDescriptor> {
    streams
        .iter()
        .find(|s| s.kind == StreamKind::AudioOnly && s.quality == quality)
        .or_else(|| best_audio(streams))
}

/// Highest bitrate audio-only stream
pub fn best_audio(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
    streams
        .iter()
        .filter(|s| s.kind == StreamKind::AudioOnly)
        .max_by_key(|s| (label_number(&s.quality), s.size))
}

/// Progressive stream with exactly the requested resolution
pub fn select_progressive<'a>(
    streams: &'a [StreamDescriptor],
    quality: &str,
) -> Option<&'a StreamDescriptor> {
    streams
        .iter()
        .find(|s| s.kind == StreamKind::Progressive && s.quality == quality)
}

/// Video-only stream for `quality`, falling back to the highest resolution.
///
/// Among streams of equal resolution an mp4 container wins (widest muxer
/// compatibility), then the larger file.
pub fn select_video_only<'a>(
    streams: &'a [StreamDescriptor],
    quality: &str,
) -> Option<&'a StreamDescriptor> {
    let video_only = || streams.iter().filter(|s| s.kind == StreamKind::VideoOnly);

    video_only()
        .filter(|s| s.quality == quality)
        .max_by_key(|s| rank_video(s))
        .or_else(|| video_only().max_by_key(|s| rank_video(s)))
}

fn rank_video(stream: &StreamDescriptor) -> (u32, bool, u64) {
    (
        label_number(&stream.quality),
        stream.container.eq_ignore_ascii_case("mp4"),
        stream.size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_stream(kind: StreamKind, quality: &str, container: &str, size: u64) -> StreamDescriptor {
        StreamDescriptor {
            kind,
            quality: quality.to_string(),
            size,
            container: container.to_string(),
            source_url: format!("https://media.example/{}/{}", quality, container),
            http_headers: HashMap::new(),
        }
    }

    #[test]
    fn test_audio_options_dedup_and_descend() {
        let streams = vec![
            make_stream(StreamKind::AudioOnly, "128kbps", "m4a", 1),
            make_stream(StreamKind::AudioOnly, "160kbps", "webm", 1),
            make_stream(StreamKind::AudioOnly, "128kbps", "webm", 1),
            make_stream(StreamKind::AudioOnly, "70kbps", "webm", 1),
            make_stream(StreamKind::VideoOnly, "1080p", "mp4", 1),
        ];
        assert_eq!(
            quality_options(&streams, MediaMode::Audio),
            vec!["160kbps", "128kbps", "70kbps"]
        );
    }

    #[test]
    fn test_video_options_merge_progressive_and_adaptive() {
        let streams = vec![
            make_stream(StreamKind::Progressive, "360p", "mp4", 1),
            make_stream(StreamKind::VideoOnly, "1080p", "mp4", 1),
            make_stream(StreamKind::VideoOnly, "1080p", "webm", 1),
            make_stream(StreamKind::VideoOnly, "720p", "mp4", 1),
            make_stream(StreamKind::Progressive, "720p", "mp4", 1),
            make_stream(StreamKind::AudioOnly, "128kbps", "m4a", 1),
        ];
        let options = quality_options(&streams, MediaMode::Video);
        assert_eq!(options, vec!["1080p", "720p", "360p"]);

        let values: Vec<u32> = options.iter().map(|l| label_number(l)).collect();
        assert!(values.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_empty_mode_yields_sentinel() {
        let streams = vec![make_stream(StreamKind::AudioOnly, "128kbps", "m4a", 1)];
        assert_eq!(quality_options(&streams, MediaMode::Video), vec![NOT_AVAILABLE]);
        assert_eq!(quality_options(&[], MediaMode::Audio), vec![NOT_AVAILABLE]);
        assert!(!is_selectable(NOT_AVAILABLE));
        assert!(is_selectable("720p"));
    }

    #[test]
    fn test_select_audio_exact_then_fallback() {
        let streams = vec![
            make_stream(StreamKind::AudioOnly, "70kbps", "webm", 1),
            make_stream(StreamKind::AudioOnly, "160kbps", "webm", 1),
            make_stream(StreamKind::AudioOnly, "128kbps", "m4a", 1),
        ];
        assert_eq!(select_audio(&streams, "128kbps").unwrap().quality, "128kbps");
        assert_eq!(select_audio(&streams, "320kbps").unwrap().quality, "160kbps");

        let video = vec![make_stream(StreamKind::Progressive, "360p", "mp4", 1)];
        assert!(select_audio(&video, "128kbps").is_none());
    }

    #[test]
    fn test_select_progressive_requires_exact_match() {
        let streams = vec![
            make_stream(StreamKind::Progressive, "360p", "mp4", 1),
            make_stream(StreamKind::VideoOnly, "720p", "mp4", 1),
        ];
        assert!(select_progressive(&streams, "360p").is_some());
        assert!(select_progressive(&streams, "720p").is_none());
    }

    #[test]
    fn test_select_video_only_falls_back_to_highest() {
        let streams = vec![
            make_stream(StreamKind::VideoOnly, "720p", "mp4", 1),
            make_stream(StreamKind::VideoOnly, "1080p", "mp4", 1),
        ];
        assert_eq!(select_video_only(&streams, "4320p").unwrap().quality, "1080p");
        assert_eq!(select_video_only(&streams, "720p").unwrap().quality, "720p");
    }

    #[test]
    fn test_select_video_only_prefers_mp4_container() {
        let streams = vec![
            make_stream(StreamKind::VideoOnly, "1080p", "webm", 900),
            make_stream(StreamKind::VideoOnly, "1080p", "mp4", 500),
        ];
        assert_eq!(select_video_only(&streams, "1080p").unwrap().container, "mp4");
    }
}
