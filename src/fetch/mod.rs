//! Content fetcher collaborator interface.
//!
//! The scheduler fetches widget background assets (clock faces, calendar
//! and weather backgrounds) through [`ContentFetcher`], which hides the
//! real image cache behind an async trait. Errors carry a
//! transient/permanent split that drives the retry policy: transient
//! failures are retried with backoff, permanent ones are not worth a
//! second attempt.

pub mod http;

pub use http::HttpContentFetcher;

use async_trait::async_trait;
use std::path::PathBuf;

/// Errors reported by a fetch attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// A transient error (timeout, 5xx, connection refused). The scheduler
    /// retries these up to its attempt limit.
    #[error("transient fetch error: {0}")]
    Transient(String),
    /// A permanent error (4xx, malformed URL). Retrying cannot help; the
    /// scheduler short-circuits to the failure path.
    #[error("permanent fetch error: {0}")]
    Permanent(String),
}

/// Fetches a remote asset and returns a local, addressable path.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` into local storage.
    ///
    /// `force_refresh` bypasses any local cache and re-downloads.
    async fn fetch(&self, url: &str, force_refresh: bool) -> Result<PathBuf, FetchError>;
}
