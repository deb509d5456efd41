//! Engine wiring facade.
//!
//! Builds the database, stores, queue, scheduler, and rotation ticker once
//! at process start and hands out explicit handles. There are no global
//! singletons: hosts keep the [`WidgetEngine`] and pass its handles to
//! whatever needs them.

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::fetch::{ContentFetcher, HttpContentFetcher};
use crate::notify::{NullNotifier, UiNotifier};
use crate::scheduler::{JobQueue, RotationTicker, UpdateScheduler};
use crate::store::{Database, JobLedger, WidgetStateStore, WidgetStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Join handles for the engine's background tasks.
pub struct EngineHandles {
    /// Refresh worker pool.
    pub workers: Vec<tokio::task::JoinHandle<()>>,
    /// Rotation ticker loop.
    pub rotation: tokio::task::JoinHandle<()>,
}

impl EngineHandles {
    /// Abort every background task. Used at shutdown.
    pub fn abort_all(&self) {
        for worker in &self.workers {
            worker.abort();
        }
        self.rotation.abort();
    }
}

/// The wired widget engine.
pub struct WidgetEngine {
    config: EngineConfig,
    scheduler: UpdateScheduler,
}

impl WidgetEngine {
    /// Open the engine with production collaborators: SQLite storage under
    /// the configured data directory, the HTTP asset fetcher, the system
    /// clock, and no UI host attached.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpContentFetcher::new(
            config
                .fetch
                .cache_dir
                .clone()
                .unwrap_or_else(|| crate::sill_dirs::cache_dir().join("assets")),
            Duration::from_secs(config.fetch.timeout_secs),
        ));
        Self::open_with(config, fetcher, Arc::new(NullNotifier), Arc::new(SystemClock))
    }

    /// Open the engine with explicit collaborators. This is the full
    /// dependency-injection entry point; `open` is a convenience over it.
    pub fn open_with(
        config: EngineConfig,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn UiNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let data_dir = config
            .storage
            .data_dir
            .clone()
            .unwrap_or_else(crate::sill_dirs::data_dir);
        let db = Database::open(&data_dir)?;
        Ok(Self::wire(config, db, fetcher, notifier, clock))
    }

    /// Open the engine over an in-memory database. Used by tests and the
    /// harness binary.
    pub fn open_in_memory(
        config: EngineConfig,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn UiNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::wire(config, db, fetcher, notifier, clock))
    }

    fn wire(
        config: EngineConfig,
        db: Database,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn UiNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let queue = Arc::new(JobQueue::new(JobLedger::new(db.clone())));
        let scheduler = UpdateScheduler::new(
            &config.scheduler,
            queue,
            WidgetStore::new(db.clone()),
            WidgetStateStore::new(db),
            fetcher,
            notifier,
            clock,
        );
        Self { config, scheduler }
    }

    /// Recover persisted jobs and start the worker pool and rotation
    /// ticker.
    pub fn start(&self) -> Result<EngineHandles> {
        let recovered = self.scheduler.recover()?;
        if recovered > 0 {
            info!(recovered, "resuming refresh jobs from previous run");
        }

        let workers = self.scheduler.spawn_workers();
        let rotation = RotationTicker::new(
            self.scheduler.clone(),
            self.config.scheduler.rotation_interval(),
        )
        .run();

        info!(workers = workers.len(), "widget engine started");
        Ok(EngineHandles { workers, rotation })
    }

    /// Scheduler handle: enqueue entry points for hosts and event sources.
    #[must_use]
    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    /// Widget store handle for read-only consumers (renderers, pickers).
    #[must_use]
    pub fn widgets(&self) -> &WidgetStore {
        self.scheduler.widgets()
    }

    /// State store handle for UI binding.
    #[must_use]
    pub fn states(&self) -> &WidgetStateStore {
        self.scheduler.states()
    }

    /// Engine configuration in effect.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
