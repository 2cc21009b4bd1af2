//! Refresh scheduler for the simrec daemon.
//!
//! Drives rebuild cycles from a `tokio-cron-scheduler` repeated job:
//!
//! - one rebuild at start, then one per `refresh_interval`
//! - at most one rebuild at a time; fires during a rebuild are skipped
//! - status history via `RebuildRegistry`
//! - graceful shutdown via `CancellationToken`
//!
//! # Example
//!
//! ```ignore
//! use simrec_scheduler::{RefreshScheduler, SchedulerConfig};
//!
//! let config = SchedulerConfig::from_settings(&settings);
//! let mut scheduler = RefreshScheduler::new(config, cycle).await?;
//! scheduler.start().await?;
//!
//! // ... wait for a shutdown signal ...
//! scheduler.shutdown().await?;
//! ```

mod config;
mod error;
mod overlap;
mod registry;
mod scheduler;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use overlap::{OverlapGuard, RunGuard};
pub use registry::{RebuildOutcome, RebuildRegistry, RebuildState, RebuildStatus};
pub use scheduler::{RefreshScheduler, RefreshTask, TickOutcome};
