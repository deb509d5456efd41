//! Configuration types for the widget engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for the widget engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scheduler worker-pool and retry settings.
    pub scheduler: SchedulerConfig,
    /// Asset fetch settings.
    pub fetch: FetchConfig,
    /// Storage settings.
    pub storage: StorageConfig,
}

/// Update scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of concurrent refresh workers.
    pub workers: usize,
    /// Base retry delay in milliseconds. Attempt N waits `N × base` before
    /// attempt N+1 (linear backoff).
    pub retry_delay_base_ms: u64,
    /// Interval between rotation passes (photo/quote widgets), in seconds.
    pub rotation_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            retry_delay_base_ms: 2_000,
            rotation_interval_secs: 15 * 60,
        }
    }
}

impl SchedulerConfig {
    /// Base retry delay as a [`Duration`].
    #[must_use]
    pub fn retry_delay_base(&self) -> Duration {
        Duration::from_millis(self.retry_delay_base_ms)
    }

    /// Rotation interval as a [`Duration`].
    #[must_use]
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }
}

/// Content fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt request timeout in seconds.
    pub timeout_secs: u64,
    /// Asset cache directory (None = `{cache_dir}/assets`).
    pub cache_dir: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: crate::fetch::http::DEFAULT_TIMEOUT_SECS,
            cache_dir: None,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database directory (None = platform data dir).
    pub data_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::WidgetError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot
    /// be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::WidgetError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `{config_dir}/engine.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        crate::sill_dirs::config_dir().join("engine.toml")
    }
}
