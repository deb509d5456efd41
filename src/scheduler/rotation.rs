//! Periodic rotation re-enqueue loop.
//!
//! Photo and quote widgets advance their rotation index on a fixed
//! interval, independent of user action. Each pass enqueues an
//! `UpdateOnly` job per rotating widget through the normal queue, so the
//! dedup-and-replace rule applies to periodic refreshes exactly as it does
//! to user-driven ones.

use crate::scheduler::runner::UpdateScheduler;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Background ticker driving photo/quote rotation.
pub struct RotationTicker {
    scheduler: UpdateScheduler,
    interval: Duration,
}

impl RotationTicker {
    /// Create a ticker enqueueing one rotation pass per `interval`.
    #[must_use]
    pub fn new(scheduler: UpdateScheduler, interval: Duration) -> Self {
        Self {
            scheduler,
            interval,
        }
    }

    /// Start the background loop. The first pass runs one full interval
    /// after boot — recovered jobs own the first refresh, and a reboot must
    /// not advance every photo on the home screen.
    pub fn run(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "rotation ticker started");
            let mut interval = tokio::time::interval(self.interval);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                self.pass();
            }
        })
    }

    /// Enqueue an update for every rotating widget. Returns the number
    /// enqueued.
    pub fn pass(&self) -> usize {
        let records = match self.scheduler.widgets().list_all() {
            Ok(records) => records,
            Err(e) => {
                warn!("rotation pass cannot list widgets: {e}");
                return 0;
            }
        };

        let mut enqueued = 0;
        for record in records {
            if !record.kind.rotates() {
                continue;
            }
            match self.scheduler.enqueue_update(record.widget_id) {
                Ok(()) => enqueued += 1,
                Err(e) => warn!(widget_id = record.widget_id, "rotation enqueue failed: {e}"),
            }
        }
        debug!(enqueued, "rotation pass complete");
        enqueued
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::SchedulerConfig;
    use crate::fetch::{ContentFetcher, FetchError};
    use crate::notify::NullNotifier;
    use crate::scheduler::queue::JobQueue;
    use crate::store::{Database, JobLedger, WidgetStateStore, WidgetStore};
    use crate::widget::{WidgetPayload, WidgetRecord, WidgetSize, WidgetType};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct NoFetch;

    #[async_trait]
    impl ContentFetcher for NoFetch {
        async fn fetch(&self, _url: &str, _force: bool) -> Result<PathBuf, FetchError> {
            Err(FetchError::Permanent("no network in rotation tests".into()))
        }
    }

    fn scheduler_without_workers(db: &Database) -> UpdateScheduler {
        UpdateScheduler::new(
            &SchedulerConfig::default(),
            Arc::new(JobQueue::new(JobLedger::new(db.clone()))),
            WidgetStore::new(db.clone()),
            WidgetStateStore::new(db.clone()),
            Arc::new(NoFetch),
            Arc::new(NullNotifier),
            Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())),
        )
    }

    #[test]
    fn pass_enqueues_only_rotating_widgets() {
        let db = Database::open_in_memory().expect("open db");
        let scheduler = scheduler_without_workers(&db);

        let widgets = scheduler.widgets();
        widgets
            .upsert(&WidgetRecord {
                widget_id: 1,
                kind: WidgetType::Photo,
                size: WidgetSize::Medium,
                payload: Some(WidgetPayload::Photo {
                    photo_paths: vec!["/a.jpg".into()],
                    current_index: 0,
                }),
                last_updated: 0,
            })
            .expect("seed photo");
        widgets
            .upsert(&WidgetRecord {
                widget_id: 2,
                kind: WidgetType::Quote,
                size: WidgetSize::Small,
                payload: Some(WidgetPayload::Quote {
                    quotes: vec!["a".into(), "b".into()],
                    current_index: 0,
                }),
                last_updated: 0,
            })
            .expect("seed quote");
        widgets
            .upsert(&WidgetRecord::placed(
                3,
                WidgetType::DigitalClock(crate::widget::types::ClockFace::Type1),
                WidgetSize::Small,
            ))
            .expect("seed clock");

        let ticker = RotationTicker::new(scheduler, Duration::from_secs(900));
        assert_eq!(ticker.pass(), 2);
    }

    #[test]
    fn repeated_passes_dedup_per_widget() {
        let db = Database::open_in_memory().expect("open db");
        let queue = Arc::new(JobQueue::new(JobLedger::new(db.clone())));
        let scheduler = UpdateScheduler::new(
            &SchedulerConfig::default(),
            Arc::clone(&queue),
            WidgetStore::new(db.clone()),
            WidgetStateStore::new(db.clone()),
            Arc::new(NoFetch),
            Arc::new(NullNotifier),
            Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())),
        );

        scheduler
            .widgets()
            .upsert(&WidgetRecord {
                widget_id: 1,
                kind: WidgetType::Photo,
                size: WidgetSize::Medium,
                payload: Some(WidgetPayload::Photo {
                    photo_paths: vec!["/a.jpg".into()],
                    current_index: 0,
                }),
                last_updated: 0,
            })
            .expect("seed");

        // No workers are draining the queue: a second pass replaces the
        // first pass's pending job instead of stacking a duplicate.
        let ticker = RotationTicker::new(scheduler, Duration::from_secs(900));
        ticker.pass();
        ticker.pass();
        assert_eq!(queue.pending_len(), 1);
    }
}
