//! Error types for the widget engine.

/// Top-level error type for the widget update pipeline.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    /// Widget record storage error.
    #[error("store error: {0}")]
    Store(String),

    /// Widget state persistence error.
    #[error("state error: {0}")]
    State(String),

    /// Scheduler error (queue, ledger, worker pool).
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Content fetch error surfaced outside the retry loop.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, WidgetError>;
