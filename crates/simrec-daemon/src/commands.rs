//! Command implementations for the simrec daemon.
//!
//! Handles:
//! - start: Load config, open the cache, run the refresh loop
//! - rebuild: One rebuild cycle, then exit
//! - similar: Read one item's published list from the cache
//! - stop: Signal running daemon to stop (via PID file)
//! - status: Check if daemon is running

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use simrec_engine::{EngineContext, RebuildCycle, RebuildReport};
use simrec_scheduler::{RefreshScheduler, SchedulerConfig};
use simrec_storage::{JsonFileSource, MemoryCache, RecommendationCache, RocksCache};
use simrec_types::{parse_similar_ids, similar_items_key, Settings, SIMILAR_ITEMS_PREFIX};

/// Get the PID file path
fn pid_file_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| {
            #[cfg(unix)]
            {
                dirs.runtime_dir()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| dirs.cache_dir().to_path_buf())
            }
            #[cfg(not(unix))]
            {
                dirs.cache_dir().to_path_buf()
            }
        })
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("simrec")
        .join("daemon.pid")
}

fn write_pid_file() -> Result<()> {
    let pid_path = pid_file_path();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&pid_path, std::process::id().to_string())?;
    info!("Wrote PID file: {:?}", pid_path);
    Ok(())
}

fn remove_pid_file() {
    let pid_path = pid_file_path();
    if pid_path.exists() {
        if let Err(e) = fs::remove_file(&pid_path) {
            warn!("Failed to remove PID file: {}", e);
        } else {
            info!("Removed PID file");
        }
    }
}

fn read_pid_file() -> Option<u32> {
    fs::read_to_string(pid_file_path())
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    // Signal 0 only checks that the process exists
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(not(unix))]
fn is_process_running(_pid: u32) -> bool {
    true
}

/// Apply CLI overrides (highest precedence).
pub fn apply_overrides(
    mut settings: Settings,
    items_override: Option<&str>,
    cache_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Settings {
    if let Some(items) = items_override {
        settings.item_source_path = items.to_string();
    }
    if let Some(cache) = cache_override {
        settings.cache_path = cache.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    settings
}

fn load_settings(
    config_path: Option<&str>,
    items_override: Option<&str>,
    cache_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let settings = Settings::load(config_path).context("Failed to load configuration")?;
    let settings = apply_overrides(settings, items_override, cache_override, log_level_override);
    settings
        .validate()
        .context("Invalid configuration after CLI overrides")?;
    Ok(settings)
}

fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn open_rocks_cache(settings: &Settings) -> Result<RocksCache> {
    let cache_path = settings.expanded_cache_path();
    fs::create_dir_all(&cache_path).context("Failed to create cache directory")?;
    RocksCache::open(&cache_path).context("Failed to open recommendation cache")
}

/// Flush the cache to disk and log how many lists it holds.
fn close_rocks_cache(cache: &RocksCache) {
    if let Err(e) = cache.flush() {
        warn!(error = %e, "Failed to flush recommendation cache");
    }
    match cache.count_prefix(SIMILAR_ITEMS_PREFIX) {
        Ok(keys) => info!(keys, "Recommendation cache flushed"),
        Err(e) => warn!(error = %e, "Failed to count cached lists"),
    }
}

/// Wire the item source and cache named by `settings` into an engine context.
///
/// Also returns the RocksDB handle (absent when `ephemeral`) so the caller
/// can flush it on exit.
pub fn build_context(
    settings: Settings,
    ephemeral: bool,
) -> Result<(EngineContext, Option<Arc<RocksCache>>)> {
    let source = Arc::new(JsonFileSource::new(settings.expanded_item_source_path()));
    let (cache, rocks): (Arc<dyn RecommendationCache>, _) = if ephemeral {
        (Arc::new(MemoryCache::new()), None)
    } else {
        let rocks = Arc::new(open_rocks_cache(&settings)?);
        (rocks.clone(), Some(rocks))
    };
    Ok((EngineContext::new(settings, source, cache), rocks))
}

/// Run a single rebuild cycle against `settings`.
pub async fn rebuild_once(settings: Settings) -> Result<RebuildReport> {
    let (ctx, rocks) = build_context(settings, false)?;
    let cycle = RebuildCycle::new(Arc::new(ctx));
    let report = cycle.run().await.context("Rebuild cycle failed");
    if let Some(rocks) = rocks {
        close_rocks_cache(&rocks);
    }
    report
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Start the refresh daemon.
///
/// 1. Load configuration (defaults -> file -> env -> CLI)
/// 2. Open the item source and cache
/// 3. Rebuild once, then on every refresh interval
/// 4. Handle graceful shutdown on SIGINT/SIGTERM
pub async fn start_daemon(
    config_path: Option<&str>,
    items_override: Option<&str>,
    cache_override: Option<&str>,
    ephemeral: bool,
    log_level_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, items_override, cache_override, log_level_override)?;
    init_logging(&settings.log_level)?;

    info!("simrec daemon starting...");
    info!("Configuration:");
    info!("  Item source: {}", settings.item_source_path);
    if ephemeral {
        info!("  Cache: in-memory (ephemeral)");
    } else {
        info!("  Cache: {}", settings.cache_path);
    }
    info!("  Refresh interval: {}s", settings.refresh_interval_secs);
    info!("  Top K: {}", settings.top_k);
    info!("  Min document frequency: {}", settings.min_document_frequency);

    let scheduler_config = SchedulerConfig::from_settings(&settings);
    let (ctx, rocks) = build_context(settings, ephemeral)?;
    let cycle = Arc::new(RebuildCycle::new(Arc::new(ctx)));

    let mut scheduler = RefreshScheduler::new(scheduler_config, cycle)
        .await
        .context("Failed to create refresh scheduler")?;

    write_pid_file()?;

    let result = async {
        scheduler
            .start()
            .await
            .context("Failed to start refresh scheduler")?;
        shutdown_signal().await;
        scheduler
            .shutdown()
            .await
            .context("Failed to shut down refresh scheduler")
    }
    .await;

    let status = scheduler.status().await;
    info!(
        runs = status.run_count,
        errors = status.error_count,
        skipped = status.skip_count,
        "Refresh loop stopped"
    );
    if let Some(rocks) = rocks {
        close_rocks_cache(&rocks);
    }

    remove_pid_file();
    result
}

/// Run one rebuild cycle and print its report as JSON.
pub async fn run_rebuild(
    config_path: Option<&str>,
    items_override: Option<&str>,
    cache_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, items_override, cache_override, log_level_override)?;
    init_logging(&settings.log_level)?;

    let report = rebuild_once(settings).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print the published list for `item_id`, nearest first.
pub async fn show_similar(
    config_path: Option<&str>,
    item_id: &str,
    cache_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, None, cache_override, None)?;
    let cache = open_rocks_cache(&settings)?;

    let key = similar_items_key(item_id);
    match cache.get(&key).await? {
        Some(value) => {
            let ids = parse_similar_ids(&value);
            if ids.is_empty() {
                println!("{}: no similar items", item_id);
            }
            for (rank, id) in ids.iter().enumerate() {
                println!("{:>3}. {}", rank + 1, id);
            }
        }
        None => println!("No recommendations published for {}", item_id),
    }
    Ok(())
}

/// Stop the running daemon by sending SIGTERM.
pub fn stop_daemon() -> Result<()> {
    let pid = read_pid_file().context("No PID file found - daemon may not be running")?;

    if !is_process_running(pid) {
        remove_pid_file();
        anyhow::bail!("Daemon not running (stale PID file removed)");
    }

    #[cfg(unix)]
    {
        unsafe {
            if libc::kill(pid as i32, libc::SIGTERM) != 0 {
                anyhow::bail!("Failed to send SIGTERM to daemon");
            }
        }
        println!("Sent SIGTERM to daemon (PID {})", pid);
    }

    #[cfg(not(unix))]
    {
        anyhow::bail!("Stop command not supported on this platform");
    }

    Ok(())
}

/// Show daemon status.
pub fn show_status() -> Result<()> {
    let pid_path = pid_file_path();

    match read_pid_file() {
        Some(pid) if is_process_running(pid) => {
            println!("simrec daemon is running (PID {})", pid);
            println!("PID file: {:?}", pid_path);
        }
        Some(pid) => {
            println!(
                "simrec daemon is NOT running (stale PID {} in {:?})",
                pid, pid_path
            );
        }
        None => {
            println!("simrec daemon is NOT running (no PID file)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_pid_file_path() {
        let path = pid_file_path();
        assert!(path.ends_with("daemon.pid"));
        assert!(path
            .parent()
            .unwrap()
            .to_string_lossy()
            .contains("simrec"));
    }

    #[test]
    fn test_apply_overrides() {
        let settings = apply_overrides(
            Settings::default(),
            Some("/data/items.jsonl"),
            None,
            Some("debug"),
        );
        assert_eq!(settings.item_source_path, "/data/items.jsonl");
        assert_eq!(settings.cache_path, Settings::default().cache_path);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_build_context_ephemeral() {
        let (ctx, rocks) = build_context(Settings::default(), true).unwrap();
        assert!(rocks.is_none());
        assert_eq!(ctx.cache.describe(), "memory");
        assert!(ctx.source.describe().starts_with("json:"));
    }

    #[tokio::test]
    async fn test_rebuild_once_writes_rocks_cache() {
        let dir = TempDir::new().unwrap();
        let items_path = dir.path().join("items.jsonl");
        let mut file = fs::File::create(&items_path).unwrap();
        writeln!(file, r#"{{"id": "1", "title": "oak table", "status": "ACTIVE"}}"#).unwrap();
        writeln!(file, r#"{{"id": "2", "title": "oak chair", "status": "ACTIVE"}}"#).unwrap();
        writeln!(file, r#"{{"id": "3", "title": "steel lamp", "status": "SOLD"}}"#).unwrap();
        drop(file);

        let cache_path = dir.path().join("cache");
        let settings = Settings {
            item_source_path: items_path.to_string_lossy().to_string(),
            cache_path: cache_path.to_string_lossy().to_string(),
            ..Default::default()
        };

        let report = rebuild_once(settings).await.unwrap();
        assert_eq!(report.entries, 2);
        assert_eq!(report.corpus.received, 2);

        let cache = RocksCache::open(&cache_path).unwrap();
        assert_eq!(
            cache.get("similar_items:1").await.unwrap(),
            Some("2".to_string())
        );
        assert!(cache.get("similar_items:3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rebuild_once_missing_export_fails() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            item_source_path: dir.path().join("absent.json").to_string_lossy().to_string(),
            cache_path: dir.path().join("cache").to_string_lossy().to_string(),
            ..Default::default()
        };
        assert!(rebuild_once(settings).await.is_err());
    }
}
