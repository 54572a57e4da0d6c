// Progress reporting for running transfers

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::models::{ItemStatus, StreamDescriptor};
use super::traits::ProgressSink;
use crate::events::{EventSender, UiEvent};

/// Derived numbers for one progress callback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub downloaded: u64,
    /// 0.0 ..= 1.0
    pub percent: f64,
    /// Bytes per second, when elapsed time is known
    pub speed: Option<f64>,
    pub eta: Option<Duration>,
}

impl ProgressSnapshot {
    pub fn compute(total: u64, remaining: u64, elapsed: Option<Duration>) -> Self {
        let downloaded = total.saturating_sub(remaining);
        let percent = if total > 0 {
            downloaded as f64 / total as f64
        } else {
            0.0
        };

        let speed = elapsed
            .map(|e| e.as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .map(|secs| downloaded as f64 / secs);

        let eta = speed
            .filter(|s| *s > 0.0 && s.is_finite())
            .and_then(|s| Duration::try_from_secs_f64((total - downloaded) as f64 / s).ok());

        Self {
            total,
            downloaded,
            percent,
            speed,
            eta,
        }
    }

    /// "12.34MB / 56.78MB"
    pub fn size_text(&self) -> String {
        format!(
            "{:.2}MB / {:.2}MB",
            self.downloaded as f64 / 1e6,
            self.total as f64 / 1e6
        )
    }

    /// Size text plus speed and ETA when known
    pub fn status_text(&self) -> String {
        let mut text = self.size_text();
        if let Some(speed) = self.speed {
            text.push_str(&format!(" @ {:.2}MB/s", speed / 1e6));
        }
        if let Some(eta) = self.eta {
            let secs = eta.as_secs();
            text.push_str(&format!(" ETA {:02}:{:02}", secs / 60, secs % 60));
        }
        text
    }
}

/// Forwards transfer progress of one batch item to the UI
pub struct ProgressReporter {
    index: usize,
    events: EventSender,
    started: Mutex<Instant>,
}

impl ProgressReporter {
    pub fn new(index: usize, events: EventSender) -> Self {
        Self {
            index,
            events,
            started: Mutex::new(Instant::now()),
        }
    }

    fn elapsed(&self) -> Option<Duration> {
        self.started.lock().ok().map(|started| started.elapsed())
    }
}

impl ProgressSink for ProgressReporter {
    fn begin_transfer(&self, stream: &StreamDescriptor) {
        if let Ok(mut started) = self.started.lock() {
            *started = Instant::now();
        }
        log::debug!(
            "[Progress] item {} transfer started ({:?} {})",
            self.index,
            stream.kind,
            stream.quality
        );
    }

    fn on_progress(&self, total: u64, remaining: u64) {
        let snapshot = ProgressSnapshot::compute(total, remaining, self.elapsed());
        self.events.post(UiEvent::ProgressUpdate {
            index: self.index,
            snapshot,
        });
    }

    fn on_merge(&self) {
        self.events.post(UiEvent::ItemStatusChanged {
            index: self.index,
            status: ItemStatus::Merging,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_channel;

    #[test]
    fn test_percent_from_remaining() {
        let snap = ProgressSnapshot::compute(1000, 400, None);
        assert_eq!(snap.downloaded, 600);
        assert!((snap.percent - 0.6).abs() < f64::EPSILON);
        assert!(snap.speed.is_none());
        assert!(snap.eta.is_none());
    }

    #[test]
    fn test_zero_total_does_not_divide() {
        let snap = ProgressSnapshot::compute(0, 0, Some(Duration::from_secs(1)));
        assert_eq!(snap.percent, 0.0);
        assert_eq!(snap.speed, Some(0.0));
        assert!(snap.eta.is_none());
    }

    #[test]
    fn test_remaining_larger_than_total_saturates() {
        let snap = ProgressSnapshot::compute(100, 500, None);
        assert_eq!(snap.downloaded, 0);
        assert_eq!(snap.percent, 0.0);
    }

    #[test]
    fn test_speed_and_eta() {
        let snap = ProgressSnapshot::compute(1000, 500, Some(Duration::from_secs(5)));
        assert_eq!(snap.speed, Some(100.0));
        assert_eq!(snap.eta, Some(Duration::from_secs(5)));
        assert!(snap.status_text().contains("ETA 00:05"));
    }

    #[test]
    fn test_zero_elapsed_omits_speed() {
        let snap = ProgressSnapshot::compute(1000, 500, Some(Duration::ZERO));
        assert!(snap.speed.is_none());
        assert!(snap.eta.is_none());
    }

    #[test]
    fn test_size_text() {
        let snap = ProgressSnapshot::compute(2_500_000, 1_250_000, None);
        assert_eq!(snap.size_text(), "1.25MB / 2.50MB");
    }

    #[test]
    fn test_reporter_posts_updates_and_merge_status() {
        let (tx, mut rx) = event_channel();
        let reporter = ProgressReporter::new(3, tx);

        reporter.on_progress(1000, 400);
        reporter.on_merge();

        match rx.try_recv().unwrap() {
            UiEvent::ProgressUpdate { index, snapshot } => {
                assert_eq!(index, 3);
                assert_eq!(snapshot.downloaded, 600);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            rx.try_recv().unwrap(),
            UiEvent::ItemStatusChanged {
                index: 3,
                status: ItemStatus::Merging
            }
        ));
    }
}
