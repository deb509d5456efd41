//! Per-widget display state machine records.
//!
//! Independent of the widget record store: exactly one state row exists per
//! widget id, replaced atomically on every job completion and removed only
//! when the widget instance is deleted. Reads never fail — absent or
//! corrupt rows degrade to [`AppWidgetState::Init`] so a bad row can never
//! wedge a widget.
//!
//! UI-reactive consumers subscribe through [`WidgetStateStore::observe`],
//! which hands out a watch-backed stream with latest-value semantics: a
//! late subscriber immediately sees the current state, not history.

use crate::error::{Result, WidgetError};
use crate::store::Database;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

/// Display state of one widget.
///
/// `Init` and `Loading` are only set at refresh start; every job run ends
/// in exactly one of `Empty`, `Success`, or `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AppWidgetState {
    /// Never refreshed (or the stored state row was unreadable).
    #[default]
    Init,
    /// A refresh job is running its first attempt.
    Loading,
    /// A refresh finished with nothing to show.
    Empty,
    /// A refresh committed new content.
    Success {
        /// Encoded payload blob committed by the refresh.
        snapshot: String,
    },
    /// A refresh failed terminally.
    Error {
        message: String,
        #[serde(default)]
        cause: Option<String>,
    },
}

impl AppWidgetState {
    /// `true` for states that end a job run (no further automatic retry).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppWidgetState::Empty | AppWidgetState::Success { .. } | AppWidgetState::Error { .. }
        )
    }
}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Durable store of per-widget display states with watch subscriptions.
#[derive(Clone)]
pub struct WidgetStateStore {
    db: Database,
    subscribers: Arc<Mutex<HashMap<i64, watch::Sender<AppWidgetState>>>>,
}

impl WidgetStateStore {
    /// Create a store over the shared engine database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db,
            subscribers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current state for a widget.
    ///
    /// Infallible by contract: a missing row, an unreadable row, or a
    /// storage error all read as `Init` (with a logged warning for the
    /// latter two).
    #[must_use]
    pub fn get(&self, widget_id: i64) -> AppWidgetState {
        let conn = match self.db.lock() {
            Ok(conn) => conn,
            Err(e) => {
                warn!(widget_id, "state read failed, degrading to Init: {e}");
                return AppWidgetState::Init;
            }
        };
        let blob: Option<String> = match conn
            .query_row(
                "SELECT state FROM widget_states WHERE widget_id = ?1",
                params![widget_id],
                |row| row.get(0),
            ) {
            Ok(blob) => Some(blob),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                warn!(widget_id, "state read failed, degrading to Init: {e}");
                None
            }
        };

        let Some(blob) = blob else {
            return AppWidgetState::Init;
        };
        match serde_json::from_str(&blob) {
            Ok(state) => state,
            Err(e) => {
                warn!(widget_id, "malformed state row, degrading to Init: {e}");
                AppWidgetState::Init
            }
        }
    }

    /// Atomically replace the widget's state and publish to subscribers.
    ///
    /// The whole value is replaced — there is no partial merge.
    pub fn transition(&self, widget_id: i64, state: AppWidgetState) -> Result<()> {
        let blob = serde_json::to_string(&state)
            .map_err(|e| WidgetError::State(format!("cannot encode state: {e}")))?;
        {
            let conn = self.db.lock()?;
            conn.execute(
                "INSERT OR REPLACE INTO widget_states (widget_id, state, updated_at) \
                 VALUES (?1, ?2, ?3)",
                params![widget_id, blob, now_epoch_secs()],
            )
            .map_err(|e| WidgetError::State(e.to_string()))?;
        }

        if let Ok(subscribers) = self.subscribers.lock()
            && let Some(sender) = subscribers.get(&widget_id)
        {
            sender.send_replace(state);
        }
        Ok(())
    }

    /// Subscribe to state changes for one widget.
    ///
    /// The stream yields the current state immediately, then every
    /// subsequent transition.
    #[must_use]
    pub fn observe(&self, widget_id: i64) -> WatchStream<AppWidgetState> {
        let current = self.get(widget_id);
        let receiver = match self.subscribers.lock() {
            Ok(mut subscribers) => {
                let sender = subscribers
                    .entry(widget_id)
                    .or_insert_with(|| watch::channel(current.clone()).0);
                sender.subscribe()
            }
            Err(_) => watch::channel(current).1,
        };
        WatchStream::new(receiver)
    }

    /// Remove the state row when the widget instance is deleted.
    pub fn remove(&self, widget_id: i64) -> Result<()> {
        {
            let conn = self.db.lock()?;
            conn.execute(
                "DELETE FROM widget_states WHERE widget_id = ?1",
                params![widget_id],
            )
            .map_err(|e| WidgetError::State(e.to_string()))?;
        }
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.remove(&widget_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use tokio_stream::StreamExt;

    fn store() -> WidgetStateStore {
        WidgetStateStore::new(Database::open_in_memory().expect("open db"))
    }

    #[test]
    fn absent_state_reads_as_init() {
        assert_eq!(store().get(1), AppWidgetState::Init);
    }

    #[test]
    fn transition_replaces_whole_state() {
        let store = store();
        store.transition(1, AppWidgetState::Loading).expect("loading");
        store
            .transition(
                1,
                AppWidgetState::Error {
                    message: "fetch failed".into(),
                    cause: Some("timeout".into()),
                },
            )
            .expect("error");

        assert_eq!(
            store.get(1),
            AppWidgetState::Error {
                message: "fetch failed".into(),
                cause: Some("timeout".into()),
            }
        );
    }

    #[test]
    fn states_are_independent_per_widget() {
        let store = store();
        store.transition(1, AppWidgetState::Loading).expect("transition");
        store
            .transition(2, AppWidgetState::Success { snapshot: "{}".into() })
            .expect("transition");

        assert_eq!(store.get(1), AppWidgetState::Loading);
        assert_eq!(store.get(2), AppWidgetState::Success { snapshot: "{}".into() });
    }

    #[test]
    fn corrupt_state_row_degrades_to_init() {
        let store = store();
        store.transition(1, AppWidgetState::Empty).expect("transition");
        store
            .db
            .lock()
            .expect("lock")
            .execute("UPDATE widget_states SET state = '!!' WHERE widget_id = 1", [])
            .expect("corrupt row");
        assert_eq!(store.get(1), AppWidgetState::Init);
    }

    #[test]
    fn remove_deletes_row() {
        let store = store();
        store.transition(1, AppWidgetState::Empty).expect("transition");
        store.remove(1).expect("remove");
        assert_eq!(store.get(1), AppWidgetState::Init);
    }

    #[tokio::test]
    async fn late_subscriber_sees_current_state_immediately() {
        let store = store();
        store
            .transition(7, AppWidgetState::Success { snapshot: "{}".into() })
            .expect("transition");

        let mut stream = store.observe(7);
        let first = stream.next().await.expect("stream value");
        assert_eq!(first, AppWidgetState::Success { snapshot: "{}".into() });
    }

    #[tokio::test]
    async fn subscriber_receives_transitions() {
        let store = store();
        let mut stream = store.observe(7);
        assert_eq!(stream.next().await, Some(AppWidgetState::Init));

        store.transition(7, AppWidgetState::Loading).expect("transition");
        assert_eq!(stream.next().await, Some(AppWidgetState::Loading));

        store.transition(7, AppWidgetState::Empty).expect("transition");
        assert_eq!(stream.next().await, Some(AppWidgetState::Empty));
    }

    #[test]
    fn state_serde_round_trip() {
        for state in [
            AppWidgetState::Init,
            AppWidgetState::Loading,
            AppWidgetState::Empty,
            AppWidgetState::Success { snapshot: "{\"type\":\"quote\"}".into() },
            AppWidgetState::Error { message: "boom".into(), cause: None },
        ] {
            let json = serde_json::to_string(&state).unwrap();
            let restored: AppWidgetState = serde_json::from_str(&json).unwrap();
            assert_eq!(restored, state);
        }
    }
}
