// Metadata fetcher - classifies a URL and resolves it into media items

use super::errors::DownloadError;
use super::models::{FetchOutcome, Resolved};
use super::traits::MediaProvider;

/// Whether the URL points at a playlist rather than a single video
pub fn is_collection_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("list=") || lower.contains("/playlist")
}

/// Resolve `url` into a UI-ready outcome. Never returns an error.
pub async fn fetch_details(provider: &dyn MediaProvider, url: &str) -> FetchOutcome {
    let url = url.trim();
    if url.is_empty() {
        log::warn!("[Fetcher] No URL provided");
        return FetchOutcome::Failure {
            message: "No URL provided".to_string(),
        };
    }

    log::info!("[Fetcher] Fetching details from: {} (provider: {})", url, provider.name());
    match resolve(provider, url).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("[Fetcher] Failed to fetch details from URL: {}", e);
            FetchOutcome::Failure {
                message: e.to_string(),
            }
        }
    }
}

async fn resolve(provider: &dyn MediaProvider, url: &str) -> Result<FetchOutcome, DownloadError> {
    let is_collection = is_collection_url(url);

    let (title, items) = match provider.resolve(url, is_collection).await? {
        Resolved::Collection { title, items } => (title, items),
        Resolved::Single(item) => (item.title.clone(), vec![item]),
    };

    let Some(first) = items.first() else {
        return Err(DownloadError::EmptyCollection);
    };

    if is_collection {
        log::info!("[Fetcher] Fetched playlist: {} with {} videos", title, items.len());
    } else {
        log::info!("[Fetcher] Fetched video: {}", title);
    }

    Ok(FetchOutcome::Success {
        thumbnail_url: first.thumbnail_url.clone(),
        representative_streams: first.streams.clone(),
        title,
        is_collection,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{MediaItem, StreamDescriptor};
    use crate::downloader::traits::ProgressSink;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    struct FakeProvider {
        result: Mutex<Option<Result<Resolved, DownloadError>>>,
        seen_collection_flag: Mutex<Option<bool>>,
    }

    impl FakeProvider {
        fn returning(result: Result<Resolved, DownloadError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                seen_collection_flag: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl MediaProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn resolve(&self, _url: &str, as_collection: bool) -> Result<Resolved, DownloadError> {
            *self.seen_collection_flag.lock().unwrap() = Some(as_collection);
            self.result.lock().unwrap().take().expect("resolve called once")
        }

        async fn transfer(
            &self,
            _stream: &StreamDescriptor,
            _dest: &Path,
            _progress: &dyn ProgressSink,
            _cancel: &CancellationToken,
        ) -> Result<u64, DownloadError> {
            unreachable!("fetch never transfers")
        }
    }

    fn item(title: &str) -> MediaItem {
        MediaItem {
            url: format!("https://www.youtube.com/watch?v={}", title),
            title: title.to_string(),
            thumbnail_url: format!("https://i.example/{}.jpg", title),
            streams: vec![],
        }
    }

    #[test]
    fn test_collection_classification() {
        assert!(is_collection_url("https://www.youtube.com/playlist?list=PL123"));
        assert!(is_collection_url("https://www.youtube.com/watch?v=abc&list=PL123"));
        assert!(!is_collection_url("https://youtu.be/abc"));
        assert!(!is_collection_url("https://www.youtube.com/watch?v=abc"));
    }

    #[tokio::test]
    async fn test_single_video_success() {
        let provider = FakeProvider::returning(Ok(Resolved::Single(item("one"))));
        let outcome = fetch_details(&provider, "  https://youtu.be/one ").await;

        match outcome {
            FetchOutcome::Success {
                title,
                is_collection,
                items,
                thumbnail_url,
                ..
            } => {
                assert_eq!(title, "one");
                assert!(!is_collection);
                assert_eq!(items.len(), 1);
                assert_eq!(thumbnail_url, "https://i.example/one.jpg");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(*provider.seen_collection_flag.lock().unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_playlist_uses_first_item_for_thumbnail() {
        let provider = FakeProvider::returning(Ok(Resolved::Collection {
            title: "Mix".to_string(),
            items: vec![item("a"), item("b")],
        }));
        let outcome = fetch_details(&provider, "https://www.youtube.com/playlist?list=PL1").await;

        match outcome {
            FetchOutcome::Success {
                title,
                is_collection,
                items,
                thumbnail_url,
                ..
            } => {
                assert_eq!(title, "Mix");
                assert!(is_collection);
                assert_eq!(items.len(), 2);
                assert_eq!(thumbnail_url, "https://i.example/a.jpg");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_playlist_is_failure() {
        let provider = FakeProvider::returning(Ok(Resolved::Collection {
            title: "Empty".to_string(),
            items: vec![],
        }));
        match fetch_details(&provider, "https://www.youtube.com/playlist?list=PL0").await {
            FetchOutcome::Failure { message } => assert!(message.contains("empty")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_error_becomes_failure() {
        let provider = FakeProvider::returning(Err(DownloadError::FetchFailure(
            "Unsupported or invalid URL".to_string(),
        )));
        let outcome = fetch_details(&provider, "https://example.com/x").await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_blank_url_never_reaches_provider() {
        let provider = FakeProvider::returning(Ok(Resolved::Single(item("x"))));
        let outcome = fetch_details(&provider, "   ").await;
        assert!(!outcome.is_success());
        assert!(provider.seen_collection_flag.lock().unwrap().is_none());
    }
}
