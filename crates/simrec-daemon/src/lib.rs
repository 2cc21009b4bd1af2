//! simrec daemon library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (start, rebuild, similar, stop, status)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    apply_overrides, build_context, rebuild_once, run_rebuild, show_similar, show_status,
    start_daemon, stop_daemon,
};
