//! Logship Agent
//!
//! Ships every line read from stdin to the remote document store.
//!
//! Lines are buffered and flushed when the buffer fills up or the flush
//! interval elapses. While the store is not ready, documents wait in the
//! pending-logs directory and are replayed as soon as it is. On unix,
//! `SIGUSR1` and `SIGUSR2` stand in for the host's memory-pressure and
//! entering-background notifications and force an immediate disk flush.

use anyhow::{Context, Result};
use logship_agent::repository::{FsDiskRepository, HttpRemoteRepository};
use logship_agent::service::LogStorage;
use logship_agent::service::background::{spawn_periodic_flush, spawn_readiness_monitor};
use logship_agent::{Config, LifecycleEvents, LogFacade, Signal};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdin is the log stream being shipped
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logship_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Logship Agent");

    let config = load_config()?;
    info!(
        "Loaded configuration: device_id={}, database_url={}, log_dir={}",
        config.device_id,
        config.database_url,
        config.log_dir.display()
    );

    let remote = Arc::new(
        HttpRemoteRepository::new(config.database_url.clone(), config.request_timeout)
            .context("Failed to create remote repository")?,
    );
    let disk = Arc::new(
        FsDiskRepository::new(&config.log_dir).context("Failed to open log directory")?,
    );

    let readiness = Signal::new("remote-ready");
    let lifecycle = LifecycleEvents::new();
    let facade = LogFacade::new();

    let storage = LogStorage::builder(config.device_id.clone(), config.bundle_id.clone())
        .max_entries(config.max_entries)
        .remote(remote.clone())
        .disk(disk)
        .readiness(readiness.clone())
        .lifecycle(lifecycle.clone())
        .facade(facade.clone())
        .start()?;

    let monitor = spawn_readiness_monitor(remote, readiness, config.readiness_poll_interval);
    let flusher = if config.flush_interval.is_zero() {
        None
    } else {
        Some(spawn_periodic_flush(storage.clone(), config.flush_interval))
    };

    #[cfg(unix)]
    spawn_lifecycle_signals(lifecycle)?;

    info!("Agent initialized, reading log lines from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => facade.log(&line),
                Ok(None) => {
                    info!("Reached end of input");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read from stdin: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    monitor.abort();
    if let Some(flusher) = flusher {
        flusher.abort();
    }
    storage.stop_storing_logs();

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(e) => {
            info!("Failed to load config from environment ({}), using defaults", e);
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Maps SIGUSR1 to memory pressure and SIGUSR2 to entering background
#[cfg(unix)]
fn spawn_lifecycle_signals(lifecycle: LifecycleEvents) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut memory_pressure =
        signal(SignalKind::user_defined1()).context("Failed to listen for SIGUSR1")?;
    let mut entering_background =
        signal(SignalKind::user_defined2()).context("Failed to listen for SIGUSR2")?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(()) = memory_pressure.recv() => {
                    info!("SIGUSR1: memory pressure");
                    lifecycle.memory_pressure.notify();
                }
                Some(()) = entering_background.recv() => {
                    info!("SIGUSR2: entering background");
                    lifecycle.entering_background.notify();
                }
                else => break,
            }
        }
    });

    Ok(())
}
