//! Configuration loading for the similarity engine.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/simrec/config.toml.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::SimrecError;

/// Main engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Minimum fraction of documents a term must appear in to enter the
    /// vocabulary. Range: (0.0, 1.0].
    #[serde(default = "default_min_document_frequency")]
    pub min_document_frequency: f64,

    /// Maximum recommendations per item.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Seconds between rebuild cycles.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Bound on each item store query and each cache write (ms).
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Item store export (JSON array or JSON Lines).
    #[serde(default = "default_item_source_path")]
    pub item_source_path: String,

    /// RocksDB directory holding published recommendations.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_min_document_frequency() -> f64 {
    0.07
}

fn default_top_k() -> usize {
    16
}

fn default_refresh_interval_secs() -> u64 {
    8 * 60
}

fn default_query_timeout_ms() -> u64 {
    5_000
}

fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "simrec")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn default_item_source_path() -> String {
    data_dir().join("items.json").to_string_lossy().to_string()
}

fn default_cache_path() -> String {
    data_dir().join("cache").to_string_lossy().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_document_frequency: default_min_document_frequency(),
            top_k: default_top_k(),
            refresh_interval_secs: default_refresh_interval_secs(),
            query_timeout_ms: default_query_timeout_ms(),
            item_source_path: default_item_source_path(),
            cache_path: default_cache_path(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/simrec/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SIMREC_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SimrecError> {
        let config_dir = ProjectDirs::from("", "", "simrec")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("min_document_frequency", default_min_document_frequency())
            .map_err(|e| SimrecError::Config(e.to_string()))?
            .set_default("top_k", default_top_k() as i64)
            .map_err(|e| SimrecError::Config(e.to_string()))?
            .set_default("refresh_interval_secs", default_refresh_interval_secs() as i64)
            .map_err(|e| SimrecError::Config(e.to_string()))?
            .set_default("query_timeout_ms", default_query_timeout_ms() as i64)
            .map_err(|e| SimrecError::Config(e.to_string()))?
            .set_default("item_source_path", default_item_source_path())
            .map_err(|e| SimrecError::Config(e.to_string()))?
            .set_default("cache_path", default_cache_path())
            .map_err(|e| SimrecError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| SimrecError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: SIMREC_TOP_K, SIMREC_MIN_DOCUMENT_FREQUENCY, etc.
        // No nesting separator: keys themselves contain underscores.
        builder = builder.add_source(Environment::with_prefix("SIMREC").try_parsing(true));

        let config = builder
            .build()
            .map_err(|e| SimrecError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| SimrecError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SimrecError> {
        if !(self.min_document_frequency > 0.0 && self.min_document_frequency <= 1.0) {
            return Err(SimrecError::Config(format!(
                "min_document_frequency must be in (0.0, 1.0], got {}",
                self.min_document_frequency
            )));
        }
        if self.top_k == 0 {
            return Err(SimrecError::Config("top_k must be > 0".to_string()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(SimrecError::Config(
                "refresh_interval_secs must be > 0".to_string(),
            ));
        }
        if self.query_timeout_ms == 0 {
            return Err(SimrecError::Config("query_timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Expand ~ in the item source path.
    pub fn expanded_item_source_path(&self) -> PathBuf {
        expand_home(&self.item_source_path)
    }

    /// Expand ~ in the cache path.
    pub fn expanded_cache_path(&self) -> PathBuf {
        expand_home(&self.cache_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
