//! CLI argument parsing for the simrec daemon.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// Item-similarity recommendation engine
///
/// Periodically rebuilds "similar items" lists for every active item and
/// publishes them to a key-value cache.
#[derive(Parser, Debug)]
#[command(name = "simrec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/simrec/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refresh loop until SIGINT/SIGTERM
    Start {
        /// Override item export path
        #[arg(long)]
        items: Option<String>,

        /// Override cache directory
        #[arg(long)]
        cache: Option<String>,

        /// Publish to an in-process cache instead of RocksDB
        #[arg(long)]
        ephemeral: bool,
    },

    /// Run exactly one rebuild cycle and print its report
    Rebuild {
        /// Override item export path
        #[arg(long)]
        items: Option<String>,

        /// Override cache directory
        #[arg(long)]
        cache: Option<String>,
    },

    /// Print the published recommendations for one item
    Similar {
        /// Item id to look up
        item_id: String,

        /// Override cache directory
        #[arg(long)]
        cache: Option<String>,
    },

    /// Stop the running daemon
    Stop,

    /// Show daemon status
    Status,
}
