//! Per-widget refresh scheduling.
//!
//! Enqueues and deduplicates refresh jobs per widget id, runs them on a
//! worker pool with bounded retry, and drives the widget store, the state
//! store, and the UI notifier to a terminal state for every run.

pub mod job;
pub mod queue;
pub mod rotation;
pub mod runner;

pub use job::{JobKind, RefreshJob};
pub use queue::JobQueue;
pub use rotation::RotationTicker;
pub use runner::{MAX_RETRY, UpdateScheduler};
