//! simrec daemon
//!
//! Publishes nearest-neighbor "similar items" lists for the active catalog.
//!
//! # Usage
//!
//! ```bash
//! simrec start [--items PATH] [--cache PATH] [--ephemeral]
//! simrec rebuild [--items PATH] [--cache PATH]
//! simrec similar <ITEM_ID> [--cache PATH]
//! simrec stop
//! simrec status
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/simrec/config.toml)
//! 3. Environment variables (SIMREC_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use simrec_daemon::{
    run_rebuild, show_similar, show_status, start_daemon, stop_daemon, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            items,
            cache,
            ephemeral,
        } => {
            start_daemon(
                cli.config.as_deref(),
                items.as_deref(),
                cache.as_deref(),
                ephemeral,
                cli.log_level.as_deref(),
            )
            .await?;
        }
        Commands::Rebuild { items, cache } => {
            run_rebuild(
                cli.config.as_deref(),
                items.as_deref(),
                cache.as_deref(),
                cli.log_level.as_deref(),
            )
            .await?;
        }
        Commands::Similar { item_id, cache } => {
            show_similar(cli.config.as_deref(), &item_id, cache.as_deref()).await?;
        }
        Commands::Stop => {
            stop_daemon()?;
        }
        Commands::Status => {
            show_status()?;
        }
    }

    Ok(())
}
