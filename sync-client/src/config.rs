//! Configuration loading for sync-client.
//!
//! Configuration is loaded from a TOML file (default: `lodge-sync.toml`).
//! Every section and field is optional.

use lodge_sync_core::StatusPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local queue storage.
    pub storage: StorageConfig,
    /// Remote booking API.
    pub remote: RemoteConfig,
    /// Automatic sync triggers.
    pub sync: SyncConfig,
    /// Tombstone retention.
    pub retention: RetentionConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite queue file (default: `offline-queue.db`).
    /// Relative paths are resolved against the data directory.
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
}

/// Remote booking API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the booking service (default: http://localhost:8000).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the create endpoint (default: /api/bookings/).
    #[serde(default = "default_create_path")]
    pub create_path: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Reachability probe timeout in seconds (default: 5).
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Which 4xx statuses are retried rather than rejected.
    #[serde(default)]
    pub status_policy: StatusPolicy,
}

/// Automatic sync configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Reachability probe interval in seconds (default: 5). 0 disables probing.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Periodic sync interval in seconds (default: 300). 0 disables the timer.
    #[serde(default = "default_periodic_interval_secs")]
    pub periodic_interval_secs: u64,
    /// Sync on startup and on reconnect (default: true).
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,
}

/// Tombstone retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Enable the purge task (default: true).
    #[serde(default = "default_retention_enabled")]
    pub enabled: bool,
    /// Age in seconds after which resolved writes are deleted (default: 30 days).
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    /// Purge interval in seconds (default: 3600 = 1 hour).
    #[serde(default = "default_purge_interval_secs")]
    pub interval_secs: u64,
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("offline-queue.db")
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_create_path() -> String {
    "/api/bookings/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_probe_interval_secs() -> u64 {
    5
}

fn default_periodic_interval_secs() -> u64 {
    300 // 5 minutes
}

fn default_auto_sync() -> bool {
    true
}

fn default_retention_enabled() -> bool {
    true
}

fn default_max_age_secs() -> u64 {
    30 * 24 * 60 * 60 // 30 days
}

fn default_purge_interval_secs() -> u64 {
    3600 // 1 hour
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            create_path: default_create_path(),
            request_timeout_secs: default_request_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            status_policy: StatusPolicy::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval_secs(),
            periodic_interval_secs: default_periodic_interval_secs(),
            auto_sync: default_auto_sync(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_retention_enabled(),
            max_age_secs: default_max_age_secs(),
            interval_secs: default_purge_interval_secs(),
        }
    }
}

impl RemoteConfig {
    /// Full URL of the create endpoint.
    pub fn create_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.create_path.trim_start_matches('/')
        )
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reachability probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl RetentionConfig {
    /// Maximum tombstone age.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Queue database path, with relative paths resolved against `data_dir`.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        if self.storage.database.is_absolute() {
            self.storage.database.clone()
        } else {
            data_dir.join(&self.storage.database)
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.remote.base_url, "http://localhost:8000");
        assert_eq!(config.remote.create_path, "/api/bookings/");
        assert_eq!(config.remote.request_timeout_secs, 30);
        assert_eq!(config.retention.max_age_secs, 30 * 24 * 60 * 60);
        assert!(config.sync.auto_sync);
        assert_eq!(
            config.remote.status_policy.transient_client_statuses,
            vec![408, 429]
        );
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[storage]
database = "/data/queue.db"

[remote]
base_url = "https://bookings.example.com/"
request_timeout_secs = 10

[remote.status_policy]
transient_client_statuses = [401, 408, 429]

[sync]
periodic_interval_secs = 0

[retention]
max_age_secs = 86400
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.database, PathBuf::from("/data/queue.db"));
        assert_eq!(config.remote.base_url, "https://bookings.example.com/");
        assert_eq!(config.remote.create_path, "/api/bookings/");
        assert_eq!(config.remote.request_timeout(), Duration::from_secs(10));
        assert_eq!(
            config.remote.status_policy.transient_client_statuses,
            vec![401, 408, 429]
        );
        assert_eq!(config.sync.periodic_interval_secs, 0);
        assert_eq!(config.sync.probe_interval_secs, 5);
        assert_eq!(config.retention.max_age(), Duration::from_secs(86400));
        assert!(config.retention.enabled);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.storage.database, PathBuf::from("offline-queue.db"));
        assert_eq!(config.sync.periodic_interval_secs, 300);
    }

    #[test]
    fn create_url_joins_cleanly() {
        let mut remote = RemoteConfig::default();
        assert_eq!(remote.create_url(), "http://localhost:8000/api/bookings/");

        remote.base_url = "https://api.example.com/".into();
        remote.create_path = "bookings".into();
        assert_eq!(remote.create_url(), "https://api.example.com/bookings");
    }

    #[test]
    fn relative_database_resolves_against_data_dir() {
        let config = Config::default();
        assert_eq!(
            config.database_path(Path::new("/var/lib/lodge")),
            PathBuf::from("/var/lib/lodge/offline-queue.db")
        );

        let mut config = Config::default();
        config.storage.database = PathBuf::from("/tmp/q.db");
        assert_eq!(
            config.database_path(Path::new("/var/lib/lodge")),
            PathBuf::from("/tmp/q.db")
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.remote.request_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[remote\nbase_url = ").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
