//! HTTP surface and command line for the Guesty sync pipeline.
//!
//! `sync-web serve` (the default) exposes health checks and the sync
//! trigger/status API; `sync-web run` performs one full sync and exits.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use database::Database;
use sync_engine::{SyncOrchestrator, SyncService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "sync-web")]
#[command(about = "Sync Guesty data into the local insights store")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the health and sync API
    Serve,
    /// Run one full sync in the foreground and exit
    Run,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let orchestrator = SyncOrchestrator::from_env(db.clone())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Run => match orchestrator.run_full_sync().await {
            Ok(total) => {
                info!("Sync finished, {} records synced", total);
                Ok(())
            }
            Err(err) => {
                error!("Sync failed: {}", err);
                Err(err.into())
            }
        },
        Command::Serve => {
            let service = Arc::new(SyncService::new(Arc::new(orchestrator)));
            let state = AppState::new(db, service);
            let app = routes::router().with_state(state);

            info!(addr = %config.addr, "Sync server listening");
            let listener = tokio::net::TcpListener::bind(config.addr).await?;
            axum::serve(listener, app).await?;

            Ok(())
        }
    }
}
