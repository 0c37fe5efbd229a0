//! Long-running sync agent.

use anyhow::{Context, Result};
use lodge_sync_client::{
    spawn_periodic_sync, spawn_probe_task, spawn_purge_task, SyncProgress, TriggerOutcome,
    TriggerReason,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use crate::app::App;

/// Run the agent until Ctrl-C.
pub async fn run(app: &App) -> Result<()> {
    let api = app.api()?;
    let orchestrator = app.orchestrator_with(Arc::clone(&api)).await;
    let sync = &app.config.sync;

    tracing::info!(
        data_dir = %app.data_dir.display(),
        online = orchestrator.connectivity().current(),
        "Sync agent starting"
    );

    let _progress = orchestrator.on_progress(|progress| match progress {
        SyncProgress::Running { .. } => tracing::debug!("{}", progress),
        SyncProgress::Done { .. } => tracing::info!("{}", progress),
        SyncProgress::Error { .. } => tracing::error!("{}", progress),
    });

    let _auto = sync
        .auto_sync
        .then(|| orchestrator.start(Handle::current()));

    if sync.auto_sync {
        match orchestrator.sync_if_pending(TriggerReason::Startup).await {
            TriggerOutcome::Failed(e) => tracing::error!("Startup sync failed: {}", e),
            outcome => tracing::debug!(?outcome, "Startup sync"),
        }
    }

    let tasks = [
        spawn_probe_task(
            api,
            Arc::clone(orchestrator.connectivity()),
            Duration::from_secs(sync.probe_interval_secs),
        ),
        spawn_periodic_sync(
            Arc::clone(&orchestrator),
            Duration::from_secs(sync.periodic_interval_secs),
        ),
        spawn_purge_task(Arc::clone(&app.queue), app.config.retention.clone()),
    ];

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("Shutting down");
    for task in tasks {
        task.abort();
    }
    app.queue.close().await;
    Ok(())
}
