//! Sill: home-screen widget update engine.
//!
//! Renders nothing itself — it keeps widget content fresh. For each placed
//! widget the engine guarantees at most one in-flight refresh, retries
//! transient failures with bounded linear backoff, persists a durable state
//! machine describing what the widget should currently show, and notifies
//! the UI host once new content is committed.
//!
//! # Architecture
//!
//! The engine is built from explicit components wired once at startup:
//! - **Widget type registry**: closed taxonomy of variants, total string-id
//!   mapping (`widget::types`)
//! - **Calendar engine**: pure date-grid and month arithmetic (`calendar`)
//! - **Stores**: SQLite rows for widget records, display states, and
//!   pending jobs (`store`)
//! - **Update scheduler**: dedup-and-replace queue + retrying worker pool
//!   (`scheduler`)
//! - **Collaborators**: content fetcher, UI notifier, clock (`fetch`,
//!   `notify`, `clock`)

pub mod calendar;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod scheduler;
pub mod sill_dirs;
pub mod store;
pub mod widget;

pub use config::EngineConfig;
pub use engine::{EngineHandles, WidgetEngine};
pub use error::{Result, WidgetError};
pub use scheduler::{JobKind, RefreshJob, UpdateScheduler};
pub use store::{AppWidgetState, WidgetStateStore, WidgetStore};
pub use widget::{WidgetPayload, WidgetRecord, WidgetSize, WidgetType};
