//! UI notifier collaborator interface.
//!
//! The scheduler tells the platform widget host to redraw after every
//! terminal state — including `Empty` and `Error`, so the user sees an
//! actionable placeholder instead of stale content. Redraw is
//! fire-and-forget: failures are logged, never propagated into the job.

use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Receives "redraw widget X now" requests.
pub trait UiNotifier: Send + Sync {
    /// Request a redraw of one widget. Best-effort.
    fn redraw(&self, widget_id: i64);
}

/// Notifier that drops redraws. Useful for headless tools and tests that
/// only care about store contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl UiNotifier for NullNotifier {
    fn redraw(&self, widget_id: i64) {
        debug!(widget_id, "redraw (no UI host attached)");
    }
}

/// Notifier that forwards redraw requests over an unbounded channel to the
/// embedding host (platform bridge, test harness).
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<i64>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end for the host.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<i64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UiNotifier for ChannelNotifier {
    fn redraw(&self, widget_id: i64) {
        if self.tx.send(widget_id).is_err() {
            warn!(widget_id, "redraw dropped: host channel closed");
        }
    }
}

/// Notifier that records redraw order in memory. Test-only convenience.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    redraws: Mutex<Vec<i64>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redraws observed so far, in order.
    #[must_use]
    pub fn redraws(&self) -> Vec<i64> {
        self.redraws.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl UiNotifier for RecordingNotifier {
    fn redraw(&self, widget_id: i64) {
        if let Ok(mut redraws) = self.redraws.lock() {
            redraws.push(widget_id);
        }
    }
}
