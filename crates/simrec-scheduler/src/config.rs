//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use simrec_types::Settings;

use crate::SchedulerError;

/// Configuration for the refresh scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between rebuild fires. Defaults to 480 (8 minutes).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Run one rebuild immediately on start. Defaults to true.
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,

    /// How long shutdown waits for an in-flight rebuild to finish.
    /// Defaults to 30 seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_refresh_interval() -> u64 {
    480
}

fn default_run_on_start() -> bool {
    true
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            run_on_start: default_run_on_start(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl SchedulerConfig {
    /// Scheduler settings derived from the application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            refresh_interval_secs: settings.refresh_interval_secs,
            ..Default::default()
        }
    }

    /// Validated refresh interval.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidInterval` for a zero interval.
    pub fn refresh_interval(&self) -> Result<Duration, SchedulerError> {
        if self.refresh_interval_secs == 0 {
            return Err(SchedulerError::InvalidInterval(
                "refresh_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
