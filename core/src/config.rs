//! Settings for the scan service.
//!
//! Stored as JSON at `~/.sitescan/config.json`. Every field is optional in
//! the file; missing fields take their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::application::RetryPolicy;
use crate::error::{Error, Result};
use crate::storage::write_atomic;

/// Environment variable naming the deployment environment.
pub const ENVIRONMENT_ENV: &str = "SITESCAN_ENVIRONMENT";

/// Whether the process runs in the local development environment.
///
/// Development uses a fixed local credential instead of one read from the
/// environment.
pub fn is_development_environment() -> bool {
    std::env::var(ENVIRONMENT_ENV)
        .map(|v| v.eq_ignore_ascii_case("development"))
        .unwrap_or(false)
}

/// Service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Registry file. Defaults to `registry.json` next to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_path: Option<PathBuf>,

    /// Seconds between scheduled scans.
    #[serde(default = "default_trigger_interval_secs")]
    pub trigger_interval_secs: u64,

    /// Addresses scanned at once per protocol. Derived from the CPU count when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_scans: Option<usize>,

    /// Per-port TCP connect deadline. Platform default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,

    #[serde(default = "default_activity_max_attempts")]
    pub activity_max_attempts: u32,

    #[serde(default = "default_activity_backoff_ms")]
    pub activity_backoff_ms: u64,
}

fn default_trigger_interval_secs() -> u64 {
    12 * 60 * 60
}

fn default_activity_max_attempts() -> u32 {
    3
}

fn default_activity_backoff_ms() -> u64 {
    1000
}

/// A quarter of the available CPUs, rounded up.
pub fn default_max_concurrent_scans() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.div_ceil(4).max(1)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_path: None,
            trigger_interval_secs: default_trigger_interval_secs(),
            max_concurrent_scans: None,
            connect_timeout_ms: None,
            activity_max_attempts: default_activity_max_attempts(),
            activity_backoff_ms: default_activity_backoff_ms(),
        }
    }
}

impl Settings {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.trigger_interval_secs == 0 {
            return Err(Error::Config(
                "triggerIntervalSecs must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_scans == Some(0) {
            return Err(Error::Config(
                "maxConcurrentScans must be greater than zero".to_string(),
            ));
        }
        if self.activity_max_attempts == 0 {
            return Err(Error::Config(
                "activityMaxAttempts must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_ms == Some(0) {
            return Err(Error::Config(
                "connectTimeoutMs must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn trigger_interval(&self) -> Duration {
        Duration::from_secs(self.trigger_interval_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn max_concurrent_scans(&self) -> usize {
        self.max_concurrent_scans
            .unwrap_or_else(default_max_concurrent_scans)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.activity_max_attempts,
            initial_backoff: Duration::from_millis(self.activity_backoff_ms),
        }
    }

    /// The registry file, resolving the default against `config_dir`.
    pub fn registry_path(&self, config_dir: &Path) -> PathBuf {
        self.registry_path
            .clone()
            .unwrap_or_else(|| config_dir.join("registry.json"))
    }
}

/// Reads and writes [`Settings`] on disk.
pub struct SettingsStore {
    config_path: PathBuf,
}

impl SettingsStore {
    /// Store at the default path, `~/.sitescan/config.json`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".sitescan").join("config.json"),
        })
    }

    /// Store at a custom path.
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Directory holding the config file.
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Load and validate settings. A missing file yields the defaults.
    pub async fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings, creating the directory if needed.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        write_atomic(&self.config_path, content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (SettingsStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        (SettingsStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store();
        let settings = store.load().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.trigger_interval(), Duration::from_secs(43_200));
        assert_eq!(settings.connect_timeout(), None);
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, dir) = test_store();
        let settings = Settings {
            registry_path: Some(dir.path().join("rows.json")),
            trigger_interval_secs: 60,
            max_concurrent_scans: Some(8),
            connect_timeout_ms: Some(250),
            ..Settings::default()
        };

        store.save(&settings).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, settings);
        assert_eq!(loaded.max_concurrent_scans(), 8);
        assert_eq!(loaded.connect_timeout(), Some(Duration::from_millis(250)));
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store();
        tokio::fs::write(store.path(), r#"{ "triggerIntervalSecs": 30 }"#)
            .await
            .unwrap();

        let settings = store.load().await.unwrap();
        assert_eq!(settings.trigger_interval_secs, 30);
        assert_eq!(settings.activity_max_attempts, 3);
        assert_eq!(settings.activity_backoff_ms, 1000);
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let (store, _dir) = test_store();
        tokio::fs::write(store.path(), r#"{ "maxConcurrentScans": 0 }"#)
            .await
            .unwrap();
        assert!(matches!(store.load().await, Err(Error::Config(_))));

        tokio::fs::write(store.path(), "not json").await.unwrap();
        assert!(matches!(store.load().await, Err(Error::Config(_))));
    }

    #[test]
    fn test_registry_path_default() {
        let settings = Settings::default();
        let dir = Path::new("/tmp/sitescan");
        assert_eq!(settings.registry_path(dir), dir.join("registry.json"));
    }

    #[test]
    fn test_default_concurrency_is_positive() {
        assert!(default_max_concurrent_scans() >= 1);
    }
}
