//! # lodge-sync
//!
//! Operator CLI and sync agent for the offline booking queue.
//!
//! ## Commands
//!
//! - `enqueue`: Save a booking to the offline queue
//! - `submit`: Send a booking now, or queue it if the remote is unreachable
//! - `pending`: List bookings waiting for delivery
//! - `rejected`: List bookings the remote refused
//! - `discard`: Remove a booking from the queue
//! - `sync`: Deliver pending bookings now
//! - `purge`: Delete old delivered/rejected records
//! - `run`: Keep syncing in the background until Ctrl-C
//!
//! ## Example
//!
//! ```bash
//! # Save a booking while offline
//! lodge-sync enqueue '{"name": "Ama Mensah", "id_or_telephone": "0241234567", "room_no": 4}'
//!
//! # See what is waiting
//! lodge-sync pending
//!
//! # Deliver once the network is back
//! lodge-sync sync
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod app;
mod commands;

use app::App;
use commands::{discard, enqueue, pending, purge, read_payload, run, submit, sync};

/// Offline booking queue and sync agent.
#[derive(Parser, Debug)]
#[command(name = "lodge-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory holding the queue database and config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: <data-dir>/lodge-sync.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save a booking to the offline queue
    Enqueue {
        /// Booking as a JSON object (or use --file)
        json: Option<String>,

        /// File containing the booking JSON
        #[arg(long, short, conflicts_with = "json")]
        file: Option<PathBuf>,
    },

    /// Send a booking now, queueing it if the remote is unreachable
    Submit {
        /// Booking as a JSON object (or use --file)
        json: Option<String>,

        /// File containing the booking JSON
        #[arg(long, short, conflicts_with = "json")]
        file: Option<PathBuf>,
    },

    /// List bookings waiting for delivery
    Pending,

    /// List bookings the remote refused
    Rejected,

    /// Remove a booking from the queue
    Discard {
        /// Local id printed by enqueue/submit
        local_id: String,
    },

    /// Deliver pending bookings now
    Sync,

    /// Delete resolved records past the retention period
    Purge {
        /// Override the configured maximum age, in seconds
        #[arg(long)]
        older_than_secs: Option<u64>,
    },

    /// Run the sync agent until Ctrl-C
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let app = App::open(&data_dir, cli.config.as_deref()).await?;

    match cli.command {
        Commands::Enqueue { json, file } => {
            let payload = read_payload(json.as_deref(), file.as_deref()).await?;
            enqueue::run(&app, payload).await?;
        }
        Commands::Submit { json, file } => {
            let payload = read_payload(json.as_deref(), file.as_deref()).await?;
            submit::run(&app, payload).await?;
        }
        Commands::Pending => {
            pending::run(&app).await?;
        }
        Commands::Rejected => {
            pending::rejected(&app).await?;
        }
        Commands::Discard { local_id } => {
            discard::run(&app, &local_id).await?;
        }
        Commands::Sync => {
            sync::run(&app).await?;
        }
        Commands::Purge { older_than_secs } => {
            purge::run(&app, older_than_secs.map(Duration::from_secs)).await?;
        }
        Commands::Run => {
            run::run(&app).await?;
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default: info).
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Get the default data directory for lodge-sync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "pamalodge", "lodge-sync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
