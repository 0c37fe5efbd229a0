//! Apply the retention policy now.

use anyhow::Result;
use lodge_sync_client::QueueStore;
use std::time::Duration;

use crate::app::App;

/// Run the purge command. `max_age` overrides the configured retention.
pub async fn run(app: &App, max_age: Option<Duration>) -> Result<u64> {
    let max_age = max_age.unwrap_or_else(|| app.config.retention.max_age());
    let deleted = app.queue.purge_resolved(max_age).await?;

    println!(
        "Purged {} resolved bookings older than {}s",
        deleted,
        max_age.as_secs()
    );
    Ok(deleted)
}
