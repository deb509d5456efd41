//! Durable ledger backing the scheduler queue.
//!
//! One row per widget id. `record` uses `INSERT OR REPLACE`, which is the
//! on-disk half of the queue's dedup-and-replace rule; `clear` is guarded
//! by the submission `seq` so completing an old job never erases the row
//! of a newer replacement submitted while it ran. Surviving rows are
//! reloaded at startup and re-enqueued.

use crate::error::{Result, WidgetError};
use crate::scheduler::job::RefreshJob;
use crate::store::Database;
use rusqlite::params;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Durable record of pending refresh intents.
#[derive(Clone)]
pub struct JobLedger {
    db: Database,
}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl JobLedger {
    /// Create a ledger over the shared engine database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record (or replace) the pending job for its widget id.
    pub fn record(&self, job: &RefreshJob) -> Result<()> {
        let blob = serde_json::to_string(job)
            .map_err(|e| WidgetError::Scheduler(format!("cannot encode job: {e}")))?;
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO pending_jobs (widget_id, seq, job, submitted_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![job.widget_id, job.seq as i64, blob, now_epoch_secs()],
        )
        .map_err(|e| WidgetError::Scheduler(e.to_string()))?;
        Ok(())
    }

    /// Remove the row for `widget_id` only if it still belongs to `seq`.
    ///
    /// A mismatch means a newer job replaced the row while this one ran;
    /// the newer row must survive.
    pub fn clear(&self, widget_id: i64, seq: u64) -> Result<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "DELETE FROM pending_jobs WHERE widget_id = ?1 AND seq = ?2",
            params![widget_id, seq as i64],
        )
        .map_err(|e| WidgetError::Scheduler(e.to_string()))?;
        Ok(())
    }

    /// Remove any row for `widget_id`, regardless of seq. Used when the
    /// widget instance itself is deleted.
    pub fn clear_any(&self, widget_id: i64) -> Result<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "DELETE FROM pending_jobs WHERE widget_id = ?1",
            params![widget_id],
        )
        .map_err(|e| WidgetError::Scheduler(e.to_string()))?;
        Ok(())
    }

    /// Load every surviving pending job, oldest submission first.
    ///
    /// Malformed rows are skipped with a warning — a bad row must not
    /// block recovery of the rest.
    pub fn load_all(&self) -> Result<Vec<RefreshJob>> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare("SELECT job FROM pending_jobs ORDER BY submitted_at, widget_id")
            .map_err(|e| WidgetError::Scheduler(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| WidgetError::Scheduler(e.to_string()))?;

        let mut jobs = Vec::new();
        for blob in rows {
            let blob = blob.map_err(|e| WidgetError::Scheduler(e.to_string()))?;
            match serde_json::from_str::<RefreshJob>(&blob) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!("skipping malformed pending job row: {e}"),
            }
        }
        Ok(jobs)
    }
}
