//! Append a booking to the offline queue.

use anyhow::{Context, Result};
use lodge_sync_client::QueueStore;
use lodge_sync_types::{LocalId, Payload};

use crate::app::App;

/// Run the enqueue command.
pub async fn run(app: &App, payload: Payload) -> Result<LocalId> {
    let local_id = app
        .queue
        .enqueue(&payload)
        .await
        .context("Failed to save booking offline")?;

    println!("{}", local_id);
    Ok(local_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{offline_app, payload};
    use tempfile::tempdir;

    #[tokio::test]
    async fn enqueue_persists_payload() {
        let dir = tempdir().unwrap();
        let app = offline_app(dir.path()).await;

        let id = run(&app, payload("Ama")).await.unwrap();

        let stored = app.queue.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.payload, payload("Ama"));
        assert_eq!(app.queue.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn enqueue_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let app = offline_app(dir.path()).await;
            run(&app, payload("Ama")).await.unwrap();
            run(&app, payload("Kofi")).await.unwrap();
            app.queue.close().await;
        }

        let app = offline_app(dir.path()).await;
        assert_eq!(app.queue.pending_count().await.unwrap(), 2);
    }
}
