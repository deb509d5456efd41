//! Update scheduler: worker pool and the per-attempt refresh state machine.
//!
//! Exactly one refresh runs per widget id at a time (enforced by
//! [`JobQueue`]); each job makes up to [`MAX_RETRY`] attempts with linear
//! backoff between them, and always leaves the widget in a terminal,
//! observable state — `Success`, `Empty`, or `Error` — followed by a UI
//! redraw notification.
//!
//! State machine per job run:
//!
//! ```text
//! Init ──enqueue──▶ Loading ──fetch ok, commit ok──────────▶ Success
//!                   Loading ──fetch fail, retries < MAX───▶ Loading (retry)
//!                   Loading ──retries exhausted, no prior──▶ Empty
//!                   Loading ──retries exhausted, had prior─▶ Error
//!                   Loading ──commit fails (record gone)───▶ Error (no retry)
//! ```
//!
//! `Success`, `Empty`, and `Error` are all re-enterable via a new enqueue.

use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::fetch::{ContentFetcher, FetchError};
use crate::notify::UiNotifier;
use crate::scheduler::job::{JobKind, RefreshJob};
use crate::scheduler::queue::JobQueue;
use crate::store::{AppWidgetState, WidgetStateStore, WidgetStore};
use crate::widget::payload::{PARAM_BACKGROUND_URL, build_setup_payload, build_update_payload};
use crate::widget::{WidgetCategory, WidgetRecord, WidgetSize, WidgetType};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum attempts per job before the failure becomes terminal.
pub const MAX_RETRY: u32 = 3;

/// Job parameter key: re-download the asset even on a cache hit.
pub const PARAM_FORCE_REFRESH: &str = "force_refresh";

struct SchedulerCore {
    queue: Arc<JobQueue>,
    widgets: WidgetStore,
    states: WidgetStateStore,
    fetcher: Arc<dyn ContentFetcher>,
    notifier: Arc<dyn UiNotifier>,
    clock: Arc<dyn Clock>,
    retry_delay_base: Duration,
    workers: usize,
}

/// Handle to the update scheduler. Cheap to clone.
#[derive(Clone)]
pub struct UpdateScheduler {
    core: Arc<SchedulerCore>,
}

impl UpdateScheduler {
    /// Wire a scheduler over its collaborators.
    #[must_use]
    pub fn new(
        config: &SchedulerConfig,
        queue: Arc<JobQueue>,
        widgets: WidgetStore,
        states: WidgetStateStore,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn UiNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            core: Arc::new(SchedulerCore {
                queue,
                widgets,
                states,
                fetcher,
                notifier,
                clock,
                retry_delay_base: config.retry_delay_base(),
                workers: config.workers.max(1),
            }),
        }
    }

    /// Place (or reconfigure) a widget and enqueue its setup refresh.
    ///
    /// The record skeleton is written immediately so the widget exists from
    /// the moment of placement; any prior payload is preserved until the
    /// job commits — a failed setup must not blank content that was
    /// already on screen.
    pub fn enqueue_setup(
        &self,
        widget_id: i64,
        kind: WidgetType,
        size: WidgetSize,
        params: HashMap<String, String>,
    ) -> Result<()> {
        match self.core.widgets.get(widget_id)? {
            Some(mut existing) => {
                existing.kind = kind;
                existing.size = size;
                self.core.widgets.upsert(&existing)?;
            }
            None => {
                self.core
                    .widgets
                    .upsert(&WidgetRecord::placed(widget_id, kind, size))?;
            }
        }
        info!(widget_id, kind = %kind, size = %size, "widget setup enqueued");
        self.core.queue.submit(RefreshJob::new_setup(widget_id, params))?;
        Ok(())
    }

    /// Enqueue a no-network recompute for an already configured widget.
    pub fn enqueue_update(&self, widget_id: i64) -> Result<()> {
        self.core.queue.submit(RefreshJob::update_only(widget_id))?;
        Ok(())
    }

    /// Enqueue an update for every widget in a category.
    ///
    /// Entry point for external event sources (system date, locale, or
    /// timezone changes). Returns the number of widgets enqueued.
    pub fn enqueue_redraw_all(&self, category: WidgetCategory) -> Result<usize> {
        let records = self.core.widgets.list_all()?;
        let mut enqueued = 0;
        for record in records {
            if record.kind.category() == Some(category) {
                self.enqueue_update(record.widget_id)?;
                enqueued += 1;
            }
        }
        info!(?category, enqueued, "category redraw enqueued");
        Ok(enqueued)
    }

    /// Remove a widget instance: its record, its state row, and any pending
    /// job. A refresh already running is not interrupted; its commit will
    /// observe the missing record and end in `Error` without resurrecting
    /// anything.
    pub fn delete_widget(&self, widget_id: i64) -> Result<()> {
        self.core.queue.cancel(widget_id)?;
        self.core.widgets.delete_by_id(widget_id)?;
        self.core.states.remove(widget_id)?;
        info!(widget_id, "widget deleted");
        Ok(())
    }

    /// Reload pending jobs persisted by a previous process.
    pub fn recover(&self) -> Result<usize> {
        self.core.queue.recover()
    }

    /// Spawn the worker pool. Workers run until their handles are aborted.
    #[must_use]
    pub fn spawn_workers(&self) -> Vec<tokio::task::JoinHandle<()>> {
        (0..self.core.workers)
            .map(|worker| {
                let core = Arc::clone(&self.core);
                tokio::spawn(async move {
                    debug!(worker, "refresh worker started");
                    loop {
                        let job = core.queue.claim().await;
                        let (widget_id, seq) = (job.widget_id, job.seq);
                        core.run_job(job).await;
                        if let Err(e) = core.queue.complete(widget_id, seq) {
                            warn!(widget_id, "cannot finalize job: {e}");
                        }
                    }
                })
            })
            .collect()
    }

    /// Widget store handle for read-only consumers.
    #[must_use]
    pub fn widgets(&self) -> &WidgetStore {
        &self.core.widgets
    }

    /// State store handle for UI binding.
    #[must_use]
    pub fn states(&self) -> &WidgetStateStore {
        &self.core.states
    }
}

/// How one attempt ended.
enum AttemptOutcome {
    /// Payload committed; job done.
    Committed(String),
    /// Nothing to show; terminal `Empty`.
    NothingToShow,
    /// The widget record disappeared mid-job; terminal `Error`.
    EntityGone,
    /// Transient failure; retry if attempts remain.
    Transient(String),
    /// Permanent failure; no further attempts.
    Permanent(String),
}

impl SchedulerCore {
    /// Run one job to a terminal state.
    async fn run_job(&self, mut job: RefreshJob) {
        let widget_id = job.widget_id;

        let record = match self.widgets.get(widget_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                // Deleted between enqueue and claim — cooperative cancel.
                debug!(widget_id, "skipping refresh for deleted widget");
                self.set_state(
                    widget_id,
                    AppWidgetState::Error {
                        message: "widget no longer exists".to_owned(),
                        cause: None,
                    },
                );
                self.notifier.redraw(widget_id);
                return;
            }
            Err(e) => {
                warn!(widget_id, "cannot load widget record: {e}");
                self.set_state(
                    widget_id,
                    AppWidgetState::Error {
                        message: "widget record unreadable".to_owned(),
                        cause: Some(e.to_string()),
                    },
                );
                self.notifier.redraw(widget_id);
                return;
            }
        };

        let had_prior = record.payload.is_some();
        let mut failure = String::new();

        for attempt in 1..=MAX_RETRY {
            job.attempt = attempt;
            if attempt == 1 {
                // First attempt only: retries keep the current state so the
                // widget does not flicker back into a spinner.
                self.set_state(widget_id, AppWidgetState::Loading);
            } else {
                let delay = self.retry_delay_base * (attempt - 1);
                debug!(widget_id, attempt, delay_ms = delay.as_millis() as u64, "retrying refresh");
                tokio::time::sleep(delay).await;
            }

            match self.run_attempt(&job, &record).await {
                AttemptOutcome::Committed(snapshot) => {
                    self.set_state(widget_id, AppWidgetState::Success { snapshot });
                    self.notifier.redraw(widget_id);
                    return;
                }
                AttemptOutcome::NothingToShow => {
                    self.set_state(widget_id, AppWidgetState::Empty);
                    self.notifier.redraw(widget_id);
                    return;
                }
                AttemptOutcome::EntityGone => {
                    info!(widget_id, "widget deleted during refresh, not retrying");
                    self.set_state(
                        widget_id,
                        AppWidgetState::Error {
                            message: "widget deleted during refresh".to_owned(),
                            cause: None,
                        },
                    );
                    self.notifier.redraw(widget_id);
                    return;
                }
                AttemptOutcome::Transient(message) => {
                    warn!(widget_id, attempt, max = MAX_RETRY, error = %message, "refresh attempt failed");
                    failure = message;
                }
                AttemptOutcome::Permanent(message) => {
                    warn!(widget_id, error = %message, "refresh failed permanently, not retrying");
                    failure = message;
                    break;
                }
            }
        }

        // Attempts exhausted. A widget that never had content shows the
        // empty placeholder; one with content keeps it and flags the error.
        let terminal = if had_prior {
            AppWidgetState::Error {
                message: "refresh failed".to_owned(),
                cause: Some(failure),
            }
        } else {
            AppWidgetState::Empty
        };
        self.set_state(widget_id, terminal);
        self.notifier.redraw(widget_id);
    }

    /// One attempt: fetch (NewSetup only), build payload, commit.
    async fn run_attempt(&self, job: &RefreshJob, record: &WidgetRecord) -> AttemptOutcome {
        let asset_path = match job.kind {
            JobKind::NewSetup => match self.fetch_asset(job).await {
                Ok(path) => path,
                Err(FetchError::Transient(message)) => return AttemptOutcome::Transient(message),
                Err(FetchError::Permanent(message)) => return AttemptOutcome::Permanent(message),
            },
            JobKind::UpdateOnly => None,
        };

        let payload = match job.kind {
            JobKind::NewSetup => build_setup_payload(
                record.kind,
                &job.params,
                asset_path.as_deref(),
                self.clock.as_ref(),
            ),
            JobKind::UpdateOnly => build_update_payload(
                record.kind,
                record.payload.as_ref(),
                self.clock.as_ref(),
            ),
        };
        let Some(payload) = payload else {
            return AttemptOutcome::NothingToShow;
        };

        let last_updated = self.clock.now().timestamp();
        match self.widgets.commit_payload(job.widget_id, &payload, last_updated) {
            Ok(true) => AttemptOutcome::Committed(payload.encode()),
            Ok(false) => AttemptOutcome::EntityGone,
            Err(e) => AttemptOutcome::Transient(format!("commit failed: {e}")),
        }
    }

    /// Download the background asset named by the job, if any.
    async fn fetch_asset(&self, job: &RefreshJob) -> std::result::Result<Option<String>, FetchError> {
        let Some(url) = job.params.get(PARAM_BACKGROUND_URL) else {
            return Ok(None);
        };
        let force_refresh = job
            .params
            .get(PARAM_FORCE_REFRESH)
            .is_some_and(|v| v == "true");
        let path = self.fetcher.fetch(url, force_refresh).await?;
        Ok(Some(path.to_string_lossy().into_owned()))
    }

    /// Transition the state store, degrading write failures to a warning —
    /// a state bookkeeping failure must not kill the job runner.
    fn set_state(&self, widget_id: i64, state: AppWidgetState) {
        if let Err(e) = self.states.transition(widget_id, state) {
            warn!(widget_id, "cannot persist widget state: {e}");
        }
    }
}
