//! Remove a booking from the queue.

use anyhow::Result;
use lodge_sync_client::QueueStore;
use lodge_sync_types::LocalId;

use crate::app::App;

/// Run the discard command.
pub async fn run(app: &App, local_id: &str) -> Result<()> {
    let local_id = LocalId::from(local_id);

    if !app.queue.discard(&local_id).await? {
        anyhow::bail!("No queued booking with id {}", local_id);
    }

    println!("Discarded {}", local_id);
    Ok(())
}
