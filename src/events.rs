//! Worker -> UI events
//!
//! Workers never touch UI state. Everything they want shown goes through
//! an unbounded channel of [`UiEvent`]s which the interactive loop drains.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::downloader::models::{FetchOutcome, ItemStatus, JobResult};
use crate::downloader::progress::ProgressSnapshot;

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Metadata fetch finished
    FetchResult(FetchOutcome),

    /// Progress of the transfer currently running for item `index`
    ProgressUpdate {
        index: usize,
        snapshot: ProgressSnapshot,
    },

    ItemStatusChanged {
        index: usize,
        status: ItemStatus,
    },

    /// User-visible error notification for one item
    Notification {
        title: String,
        message: String,
    },

    /// Every item reached a terminal state
    BatchComplete { results: Vec<JobResult> },
}

/// Cloneable sending half; posting never blocks and never fails the worker
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<UiEvent>,
}

impl EventSender {
    pub fn post(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("[Events] UI receiver dropped, event discarded");
        }
    }
}

pub fn event_channel() -> (EventSender, UnboundedReceiver<UiEvent>) {
    let (tx, rx) = unbounded_channel();
    (EventSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_after_receiver_dropped_is_silent() {
        let (tx, rx) = event_channel();
        drop(rx);
        tx.post(UiEvent::BatchComplete { results: vec![] });
    }

    #[test]
    fn test_events_arrive_in_order() {
        let (tx, mut rx) = event_channel();
        tx.post(UiEvent::ItemStatusChanged {
            index: 0,
            status: ItemStatus::Downloading,
        });
        tx.post(UiEvent::BatchComplete { results: vec![] });

        assert!(matches!(
            rx.try_recv().unwrap(),
            UiEvent::ItemStatusChanged { index: 0, .. }
        ));
        assert!(matches!(rx.try_recv().unwrap(), UiEvent::BatchComplete { .. }));
    }
}
