//! Dedup-and-replace job queue.
//!
//! The queue holds at most one pending job per widget id and never lets
//! two jobs for the same id run concurrently. Submitting over a queued job
//! replaces it (the old intent never runs); submitting over a running job
//! parks the newest intent until the running attempt chain finishes. This
//! per-key uniqueness is the engine's central correctness property: it is
//! what makes the widget store safe without row locking.
//!
//! Every submit is mirrored into the durable [`JobLedger`] so pending
//! intents survive a process restart; [`JobQueue::recover`] reloads them.

use crate::error::Result;
use crate::scheduler::job::RefreshJob;
use crate::store::JobLedger;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;
use tracing::debug;

#[derive(Default)]
struct QueueInner {
    /// Widget ids in submission order. A replaced job keeps its slot.
    order: VecDeque<i64>,
    /// Latest pending job per widget id.
    pending: HashMap<i64, RefreshJob>,
    /// Widget ids with a job currently running.
    running: HashSet<i64>,
}

/// Per-key unique job queue shared between the scheduler API and workers.
pub struct JobQueue {
    inner: Mutex<QueueInner>,
    ledger: JobLedger,
    notify: Notify,
    next_seq: AtomicU64,
}

impl JobQueue {
    /// Create an empty queue mirrored into `ledger`.
    #[must_use]
    pub fn new(ledger: JobLedger) -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            ledger,
            notify: Notify::new(),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Submit a job, replacing any pending job for the same widget id.
    ///
    /// Returns `true` when an older pending job was replaced (it will
    /// never run).
    pub fn submit(&self, mut job: RefreshJob) -> Result<bool> {
        job.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.ledger.record(&job)?;

        let replaced = {
            let mut inner = self.lock();
            let widget_id = job.widget_id;
            let replaced = inner.pending.insert(widget_id, job).is_some();
            if !replaced {
                inner.order.push_back(widget_id);
            }
            replaced
        };

        if replaced {
            debug!("replaced pending refresh job");
        }
        self.notify.notify_one();
        Ok(replaced)
    }

    /// Claim the oldest claimable job, waiting until one is available.
    ///
    /// A job is claimable when its widget id has no running job. The
    /// claimed id is marked running until [`Self::complete`] is called.
    pub async fn claim(&self) -> RefreshJob {
        loop {
            let notified = self.notify.notified();
            if let Some(job) = self.try_claim() {
                return job;
            }
            notified.await;
        }
    }

    /// Claim without waiting. Returns `None` when nothing is claimable.
    pub fn try_claim(&self) -> Option<RefreshJob> {
        let mut inner = self.lock();
        let QueueInner {
            order,
            pending,
            running,
        } = &mut *inner;
        let position = order.iter().position(|id| !running.contains(id))?;
        let widget_id = order.remove(position)?;
        let job = pending.remove(&widget_id)?;
        running.insert(widget_id);
        Some(job)
    }

    /// Mark a claimed job finished and release its widget id.
    ///
    /// The durable ledger row is cleared only if it still belongs to this
    /// job's `seq`; a replacement submitted mid-run keeps its row. If a
    /// replacement is parked for this id, a worker is woken to claim it.
    pub fn complete(&self, widget_id: i64, seq: u64) -> Result<()> {
        self.ledger.clear(widget_id, seq)?;
        let has_parked = {
            let mut inner = self.lock();
            inner.running.remove(&widget_id);
            inner.pending.contains_key(&widget_id)
        };
        if has_parked {
            self.notify.notify_one();
        }
        Ok(())
    }

    /// Drop any pending job for a deleted widget and erase its ledger row.
    ///
    /// A job already running is not interrupted; its commit will observe
    /// the missing record instead.
    pub fn cancel(&self, widget_id: i64) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.pending.remove(&widget_id).is_some() {
                inner.order.retain(|id| *id != widget_id);
            }
        }
        self.ledger.clear_any(widget_id)
    }

    /// Reload surviving ledger rows into the in-memory queue.
    ///
    /// Called once at startup, before workers begin claiming.
    pub fn recover(&self) -> Result<usize> {
        let jobs = self.ledger.load_all()?;
        let recovered = jobs.len();
        {
            let mut inner = self.lock();
            for job in jobs {
                let widget_id = job.widget_id;
                self.next_seq
                    .fetch_max(job.seq + 1, Ordering::Relaxed);
                if inner.pending.insert(widget_id, job).is_none() {
                    inner.order.push_back(widget_id);
                }
            }
        }
        if recovered > 0 {
            debug!(recovered, "recovered pending refresh jobs");
            self.notify.notify_one();
        }
        Ok(recovered)
    }

    /// Number of pending (not yet claimed) jobs.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// `true` when nothing is pending or running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let inner = self.lock();
        inner.pending.is_empty() && inner.running.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        // The queue mutex is only held for short, non-panicking sections;
        // recover from poisoning rather than wedging every worker.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
