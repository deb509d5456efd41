//! HTTP content fetcher with an on-disk cache.
//!
//! Downloads widget assets into a cache directory, addressing each file by
//! the SHA-256 of its URL so repeated setups for the same asset hit the
//! cache instead of the network. Each attempt has a bounded timeout; a
//! timed-out request counts as a transient failure, exactly like any other
//! transport error.

use crate::fetch::{ContentFetcher, FetchError};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-attempt request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// [`ContentFetcher`] backed by `reqwest` and a cache directory.
pub struct HttpContentFetcher {
    client: reqwest::Client,
    cache_dir: PathBuf,
}

impl HttpContentFetcher {
    /// Create a fetcher writing into `cache_dir` with the given timeout.
    #[must_use]
    pub fn new(cache_dir: PathBuf, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, cache_dir }
    }

    /// Create a fetcher with the default cache directory and timeout.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            crate::sill_dirs::cache_dir().join("assets"),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Cache path for a URL: SHA-256 of the URL, keeping the extension so
    /// renderers can sniff the format from the filename.
    fn cache_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        let mut name = format!("{digest:x}");
        if let Some(ext) = extension_of(url) {
            name.push('.');
            name.push_str(ext);
        }
        self.cache_dir.join(name)
    }
}

fn extension_of(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = Path::new(path).extension()?.to_str()?;
    (ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str, force_refresh: bool) -> Result<PathBuf, FetchError> {
        let path = self.cache_path(url);
        if !force_refresh && path.exists() {
            debug!(url, path = %path.display(), "asset cache hit");
            return Ok(path);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(FetchError::Permanent(format!("HTTP {status} for {url}")));
        }
        if !status.is_success() {
            return Err(FetchError::Transient(format!("HTTP {status} for {url}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transient(format!("body read failed: {e}")))?;

        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| FetchError::Transient(format!("cannot create cache dir: {e}")))?;

        // Write-then-rename so a crashed download never leaves a partial
        // file behind as a cache hit.
        let tmp_path = path.with_extension("part");
        std::fs::write(&tmp_path, &body)
            .map_err(|e| FetchError::Transient(format!("cannot write asset: {e}")))?;
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(FetchError::Transient(format!("cannot finalize asset: {e}")));
        }

        debug!(url, bytes = body.len(), path = %path.display(), "asset downloaded");
        Ok(path)
    }
}

/// Remove every cached asset. Best-effort; errors are logged.
pub fn clear_cache(cache_dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(cache_dir)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("cannot clear asset cache at {}: {e}", cache_dir.display());
    }
}
