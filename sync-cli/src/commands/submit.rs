//! Submit a booking, delivering it directly when the remote is reachable.

use anyhow::Result;
use lodge_sync_client::SubmitOutcome;
use lodge_sync_types::Payload;

use crate::app::App;

/// Run the submit command.
pub async fn run(app: &App, payload: Payload) -> Result<SubmitOutcome> {
    let orchestrator = app.orchestrator().await?;
    if !orchestrator.connectivity().current() {
        println!("Remote unreachable, saving offline.");
    }

    let outcome = orchestrator.submit(payload).await?;
    match &outcome {
        SubmitOutcome::Delivered => println!("Booking created."),
        SubmitOutcome::Rejected { reason } => {
            anyhow::bail!("Booking rejected: {}", reason);
        }
        SubmitOutcome::Queued(local_id) => {
            println!("Saved offline as {}", local_id);
            println!("It will be sent when the remote is reachable ('lodge-sync sync' to retry now).");
        }
    }

    Ok(outcome)
}
