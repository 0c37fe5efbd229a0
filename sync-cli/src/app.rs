//! Composition root: config, queue, API and orchestrator wiring.

use anyhow::{Context, Result};
use lodge_sync_client::{
    BookingApi, Config, ConnectivityObserver, HttpBookingApi, SqliteQueue, SyncOrchestrator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file looked up in the data directory when `--config` is absent.
pub const CONFIG_FILE: &str = "lodge-sync.toml";

/// Orchestrator over the production queue and API.
pub type Orchestrator = SyncOrchestrator<SqliteQueue, HttpBookingApi>;

/// Everything a command needs.
pub struct App {
    /// Loaded configuration.
    pub config: Config,
    /// Resolved data directory.
    pub data_dir: PathBuf,
    /// Opened offline queue.
    pub queue: Arc<SqliteQueue>,
}

impl App {
    /// Load configuration and open the queue.
    ///
    /// An explicit `config_path` must exist; the default one is optional.
    pub async fn open(data_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::from_file(path)?,
            None => Config::load_or_default(&data_dir.join(CONFIG_FILE))?,
        };
        Self::with_config(data_dir, config).await
    }

    /// Open the queue for an already loaded configuration.
    pub async fn with_config(data_dir: &Path, config: Config) -> Result<Self> {
        let db_path = config.database_path(data_dir);
        let queue = SqliteQueue::open(&db_path)
            .await
            .with_context(|| format!("Failed to open offline queue at {}", db_path.display()))?;

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            queue: Arc::new(queue),
        })
    }

    /// HTTP client for the configured remote.
    pub fn api(&self) -> Result<Arc<HttpBookingApi>> {
        let api = HttpBookingApi::new(&self.config.remote).context("Invalid remote configuration")?;
        Ok(Arc::new(api))
    }

    /// Probe the remote once and build an orchestrator seeded with the result.
    pub async fn orchestrator(&self) -> Result<Arc<Orchestrator>> {
        let api = self.api()?;
        Ok(self.orchestrator_with(api).await)
    }

    /// Same as [`App::orchestrator`], sharing an existing API client.
    pub async fn orchestrator_with(&self, api: Arc<HttpBookingApi>) -> Arc<Orchestrator> {
        let online = api.is_reachable().await;
        tracing::debug!(online, url = %api.create_url(), "Initial reachability");

        let connectivity = Arc::new(ConnectivityObserver::new(online));
        let orchestrator = SyncOrchestrator::new(Arc::clone(&self.queue), api, connectivity)
            .with_policy(self.config.remote.status_policy.clone())
            .with_request_timeout(self.config.remote.request_timeout());
        Arc::new(orchestrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_without_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let app = App::open(dir.path(), None).await.unwrap();

        assert_eq!(app.config.remote.create_path, "/api/bookings/");
        assert!(dir.path().join("offline-queue.db").exists());
    }

    #[tokio::test]
    async fn open_reads_config_from_data_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[storage]\ndatabase = \"custom.db\"\n",
        )
        .unwrap();

        App::open(dir.path(), None).await.unwrap();
        assert!(dir.path().join("custom.db").exists());
    }

    #[tokio::test]
    async fn explicit_config_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(App::open(dir.path(), Some(&missing)).await.is_err());
    }
}
