//! Show pending and rejected bookings.

use anyhow::Result;
use lodge_sync_client::QueueStore;

use super::format_age;
use crate::app::App;

/// Run the pending command.
pub async fn run(app: &App) -> Result<u64> {
    let pending = app.queue.list_pending().await?;

    println!("Pending bookings: {}", pending.len());
    for write in &pending {
        let error = write
            .last_error
            .as_deref()
            .map(|e| format!(" (last error: {})", e))
            .unwrap_or_default();
        println!(
            "  {}  queued {}  attempts: {}{}",
            write.local_id,
            format_age(write.enqueued_at),
            write.attempts,
            error
        );
    }

    Ok(pending.len() as u64)
}

/// Run the rejected command.
pub async fn rejected(app: &App) -> Result<u64> {
    let rejected = app.queue.list_rejected().await?;

    if rejected.is_empty() {
        println!("No rejected bookings.");
        return Ok(0);
    }

    println!("Rejected bookings: {}", rejected.len());
    for write in &rejected {
        let reason = write
            .resolution
            .as_ref()
            .and_then(|r| r.reason())
            .unwrap_or("unknown reason");
        let when = write
            .resolved_at
            .map(format_age)
            .unwrap_or_else(|| "unknown".to_string());
        println!("  {}  rejected {}: {}", write.local_id, when, reason);
    }
    println!();
    println!("Fix the booking and submit it again; 'lodge-sync discard <id>' removes the record.");

    Ok(rejected.len() as u64)
}
