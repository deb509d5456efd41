//! Refresh job definitions.
//!
//! A [`RefreshJob`] is the unit of work the scheduler runs: one content
//! refresh for one widget. Jobs are ephemeral and owned by the scheduler;
//! they only outlive the process through the durable queue ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a refresh job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// First configuration of a widget: may download a background asset
    /// before any content is valid.
    NewSetup,
    /// Recompute date-dependent fields / advance rotation for an already
    /// configured widget. No network.
    UpdateOnly,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::NewSetup => f.write_str("new_setup"),
            JobKind::UpdateOnly => f.write_str("update_only"),
        }
    }
}

/// One queued or running refresh for one widget id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshJob {
    /// Target widget instance.
    pub widget_id: i64,
    /// Setup vs update dispatch, decided at job start.
    pub kind: JobKind,
    /// Free-form setup parameters (asset URL, photo list, …).
    #[serde(default)]
    pub params: HashMap<String, String>,
    /// Current attempt number, 1-based once running.
    #[serde(default)]
    pub attempt: u32,
    /// Queue submission counter. Ties a claimed job to its ledger row so a
    /// finished job cannot erase a newer replacement's row.
    #[serde(default)]
    pub seq: u64,
}

impl RefreshJob {
    /// A new-setup job carrying the caller's configuration parameters.
    #[must_use]
    pub fn new_setup(widget_id: i64, params: HashMap<String, String>) -> Self {
        Self {
            widget_id,
            kind: JobKind::NewSetup,
            params,
            attempt: 0,
            seq: 0,
        }
    }

    /// An update-only job (recompute, no network).
    #[must_use]
    pub fn update_only(widget_id: i64) -> Self {
        Self {
            widget_id,
            kind: JobKind::UpdateOnly,
            params: HashMap::new(),
            attempt: 0,
            seq: 0,
        }
    }
}
