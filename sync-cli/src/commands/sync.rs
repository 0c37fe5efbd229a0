//! Run one reconciliation pass now.

use anyhow::Result;
use lodge_sync_client::TriggerOutcome;

use crate::app::App;

/// Run the sync command.
pub async fn run(app: &App) -> Result<TriggerOutcome> {
    let orchestrator = app.orchestrator().await?;
    let _progress = orchestrator.on_progress(|progress| println!("  {}", progress));

    let outcome = orchestrator.trigger_sync().await;
    match &outcome {
        TriggerOutcome::Completed(summary) => {
            println!(
                "Sync complete: {} delivered, {} rejected, {} still pending",
                summary.succeeded, summary.failed, summary.deferred
            );
            if summary.failed > 0 {
                println!("Run 'lodge-sync rejected' to see why.");
            }
        }
        TriggerOutcome::Offline => {
            let pending = orchestrator.pending_count().await?;
            println!("Remote unreachable; {} bookings remain queued.", pending);
        }
        TriggerOutcome::AlreadyRunning => println!("A sync is already running."),
        TriggerOutcome::NothingPending => println!("Nothing to sync."),
        TriggerOutcome::Failed(e) => anyhow::bail!("Sync failed: {}", e),
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{offline_app, payload};
    use lodge_sync_client::QueueStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn unreachable_remote_leaves_queue_untouched() {
        let dir = tempdir().unwrap();
        let app = offline_app(dir.path()).await;
        app.queue.enqueue(&payload("Ama")).await.unwrap();

        let outcome = run(&app).await.unwrap();

        assert_eq!(outcome, TriggerOutcome::Offline);
        assert_eq!(app.queue.pending_count().await.unwrap(), 1);
    }
}
