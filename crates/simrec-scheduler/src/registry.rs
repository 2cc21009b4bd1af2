//! Rebuild status tracking.
//!
//! The `RebuildRegistry` records what the refresh loop is doing and how its
//! recent cycles went, for logs and the daemon's status output.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the refresh loop currently is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RebuildState {
    /// No cycle has started yet
    #[default]
    Idle,
    /// A cycle is in flight
    Rebuilding,
    /// Waiting for the next fire
    Sleeping,
}

/// Result of one fire of the refresh loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Cycle completed and published
    Success {
        entries: usize,
        written: usize,
        failed_writes: usize,
    },
    /// Cycle abandoned; the cache was left as it was
    Failed { kind: String, message: String },
    /// Fire coalesced into a no-op
    Skipped(String),
}

/// Snapshot of the refresh loop's history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebuildStatus {
    pub state: RebuildState,
    /// When the last completed cycle started
    pub last_run: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub last_outcome: Option<RebuildOutcome>,
    /// Earliest time the next fire is expected
    pub next_run: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub error_count: u64,
    pub skip_count: u64,
}

/// Thread-safe holder of the current `RebuildStatus`.
///
/// # Example
///
/// ```
/// use simrec_scheduler::{RebuildOutcome, RebuildRegistry, RebuildState};
///
/// let registry = RebuildRegistry::new();
/// registry.record_start();
/// assert_eq!(registry.state(), RebuildState::Rebuilding);
///
/// registry.record_complete(
///     RebuildOutcome::Success { entries: 3, written: 3, failed_writes: 0 },
///     120,
/// );
/// assert_eq!(registry.state(), RebuildState::Sleeping);
/// assert_eq!(registry.status().run_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct RebuildRegistry {
    status: RwLock<RebuildStatus>,
}

impl RebuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a cycle has started.
    pub fn record_start(&self) {
        let mut status = self.write();
        status.state = RebuildState::Rebuilding;
        status.last_run = Some(Utc::now());
    }

    /// Record that the in-flight cycle finished, successfully or not.
    pub fn record_complete(&self, outcome: RebuildOutcome, duration_ms: u64) {
        let mut status = self.write();
        status.state = RebuildState::Sleeping;
        status.last_duration_ms = Some(duration_ms);
        status.run_count += 1;
        if matches!(outcome, RebuildOutcome::Failed { .. }) {
            status.error_count += 1;
        }
        status.last_outcome = Some(outcome);
    }

    /// Record a coalesced fire. The state is left alone: the cycle that
    /// caused the skip is still running.
    pub fn record_skip(&self, reason: impl Into<String>) {
        let mut status = self.write();
        status.skip_count += 1;
        status.last_outcome = Some(RebuildOutcome::Skipped(reason.into()));
    }

    pub fn set_next_run(&self, next: DateTime<Utc>) {
        self.write().next_run = Some(next);
    }

    pub fn state(&self) -> RebuildState {
        self.read().state
    }

    /// Copy of the current status.
    pub fn status(&self) -> RebuildStatus {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RebuildStatus> {
        self.status.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RebuildStatus> {
        self.status.write().unwrap_or_else(|e| e.into_inner())
    }
}
