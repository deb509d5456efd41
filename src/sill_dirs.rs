//! Centralized application directory paths for the widget engine.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//! All paths can be overridden for testing or custom deployments:
//! - `SILL_DATA_DIR` — overrides [`data_dir`]
//! - `SILL_CONFIG_DIR` — overrides [`config_dir`]
//! - `SILL_CACHE_DIR` — overrides [`cache_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the engine database (`widgets.db`).
///
/// Resolves to `dirs::data_dir()/sill/` by default. Override with the
/// `SILL_DATA_DIR` environment variable.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SILL_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("sill"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sill-data"))
}

/// Application config directory.
///
/// Holds `engine.toml`.
///
/// Resolves to `dirs::config_dir()/sill/` by default. Override with the
/// `SILL_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SILL_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("sill"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sill-config"))
}

/// Application cache directory.
///
/// Holds downloaded widget assets (backgrounds, clock faces). Expendable.
///
/// Resolves to `dirs::cache_dir()/sill/` by default. Override with the
/// `SILL_CACHE_DIR` environment variable.
#[must_use]
pub fn cache_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SILL_CACHE_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::cache_dir()
        .map(|d| d.join("sill"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sill-cache"))
}
