//! Refresh loop built on tokio-cron-scheduler.
//!
//! One repeated job fires every `refresh_interval`. Each fire goes through
//! the overlap guard, so at most one rebuild cycle runs at a time and fires
//! that land mid-rebuild are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use simrec_engine::RebuildCycle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::overlap::OverlapGuard;
use crate::registry::{RebuildOutcome, RebuildRegistry, RebuildStatus};
use crate::{SchedulerConfig, SchedulerError};

/// What a single fire did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Succeeded,
    Failed,
    Skipped,
}

/// The unit of work behind every fire. Cheap to clone; clones share the
/// guard, registry and cancellation token.
#[derive(Debug, Clone)]
pub struct RefreshTask {
    cycle: Arc<RebuildCycle>,
    registry: Arc<RebuildRegistry>,
    guard: Arc<OverlapGuard>,
    shutdown_token: CancellationToken,
}

impl RefreshTask {
    /// Run one rebuild unless one is already in flight or shutdown has begun.
    pub async fn tick(&self) -> TickOutcome {
        if self.shutdown_token.is_cancelled() {
            debug!("Shutdown in progress, not starting a rebuild");
            return TickOutcome::Skipped;
        }

        let Some(_run) = self.guard.try_acquire() else {
            info!("Rebuild already in progress, skipping this fire");
            self.registry.record_skip("rebuild already in progress");
            return TickOutcome::Skipped;
        };

        self.registry.record_start();
        let started = Instant::now();
        let result = self.cycle.run().await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(report) => {
                self.registry.record_complete(
                    RebuildOutcome::Success {
                        entries: report.entries,
                        written: report.publish.written,
                        failed_writes: report.publish.failed_writes,
                    },
                    duration_ms,
                );
                TickOutcome::Succeeded
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), duration_ms, "Rebuild cycle abandoned, cache left as is");
                self.registry.record_complete(
                    RebuildOutcome::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    },
                    duration_ms,
                );
                TickOutcome::Failed
            }
        };

        outcome
    }

    pub fn registry(&self) -> Arc<RebuildRegistry> {
        self.registry.clone()
    }

    pub fn is_rebuilding(&self) -> bool {
        self.guard.is_running()
    }
}

/// Owns the timer and the refresh task.
pub struct RefreshScheduler {
    scheduler: JobScheduler,
    config: SchedulerConfig,
    interval: Duration,
    task: RefreshTask,
    job_id: Mutex<Option<Uuid>>,
    is_running: AtomicBool,
}

impl RefreshScheduler {
    /// Create the scheduler. Nothing fires until `start()`.
    ///
    /// # Errors
    ///
    /// `SchedulerError::InvalidInterval` for a zero interval, or
    /// `SchedulerError::Scheduler` if the timer cannot be created.
    pub async fn new(
        config: SchedulerConfig,
        cycle: Arc<RebuildCycle>,
    ) -> Result<Self, SchedulerError> {
        let interval = config.refresh_interval()?;
        let scheduler = JobScheduler::new().await?;

        let task = RefreshTask {
            cycle,
            registry: Arc::new(RebuildRegistry::new()),
            guard: Arc::new(OverlapGuard::new()),
            shutdown_token: CancellationToken::new(),
        };

        Ok(Self {
            scheduler,
            config,
            interval,
            task,
            job_id: Mutex::new(None),
            is_running: AtomicBool::new(false),
        })
    }

    /// Register the repeated job, start the timer, and kick off the
    /// initial rebuild in the background when `run_on_start` is set.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::AlreadyRunning` if the scheduler is already started.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }

        let interval = self.interval;
        let task = self.task.clone();
        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task.tick().await;
            })
        })?;

        let uuid = self.scheduler.add(job).await?;
        *self.job_id.lock().unwrap_or_else(|e| e.into_inner()) = Some(uuid);
        self.scheduler.start().await?;
        info!(uuid = %uuid, interval_secs = interval.as_secs(), "Refresh scheduler started");

        if self.config.run_on_start {
            let task = self.task.clone();
            tokio::spawn(async move {
                task.tick().await;
            });
        }

        Ok(())
    }

    /// Run one rebuild now, subject to the same overlap rules as timer fires.
    pub async fn trigger(&self) -> TickOutcome {
        self.task.tick().await
    }

    /// Stop firing, wait (bounded) for an in-flight rebuild, then stop the timer.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NotRunning` if the scheduler is not started.
    pub async fn shutdown(&mut self) -> Result<(), SchedulerError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(SchedulerError::NotRunning);
        }

        info!("Initiating scheduler shutdown");
        self.task.shutdown_token.cancel();

        let deadline = Instant::now() + self.config.shutdown_timeout();
        while self.task.is_rebuilding() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if self.task.is_rebuilding() {
            warn!("Rebuild still running at shutdown deadline");
        }

        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Error during scheduler shutdown: {}", e);
        }

        self.is_running.store(false, Ordering::SeqCst);
        info!("Scheduler shutdown complete");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.task.shutdown_token.clone()
    }

    pub fn registry(&self) -> Arc<RebuildRegistry> {
        self.task.registry()
    }

    /// Current status, with `next_run` taken from the timer's own schedule.
    pub async fn status(&self) -> RebuildStatus {
        let job_id = *self.job_id.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(job_id) = job_id.filter(|_| self.is_running()) {
            let mut timer = self.scheduler.clone();
            match timer.next_tick_for_job(job_id).await {
                Ok(Some(next)) => self.task.registry.set_next_run(next),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "Could not read next fire time"),
            }
        }
        self.task.registry.status()
    }

    pub fn task(&self) -> &RefreshTask {
        &self.task
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}
