//! Agent configuration
//!
//! Defines all configurable parameters for the agent: the identity embedded
//! in every document, where the remote store and the pending-logs directory
//! live, and how often the background loops run.

use std::path::PathBuf;
use std::time::Duration;

use crate::service::DEFAULT_MAX_ENTRIES;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier of the device the logs come from
    pub device_id: String,

    /// Identifier of the application the logs come from
    pub bundle_id: String,

    /// URL of the remote database documents are posted to
    pub database_url: String,

    /// Directory holding documents that could not be delivered yet
    pub log_dir: PathBuf,

    /// Number of buffered entries that forces a flush
    pub max_entries: usize,

    /// How often buffered logs are flushed regardless of size (zero disables)
    pub flush_interval: Duration,

    /// How often the remote store is probed for readiness
    pub readiness_poll_interval: Duration,

    /// Upper bound on every request to the remote store
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(device_id: String, bundle_id: String, database_url: String) -> Self {
        Self {
            device_id,
            bundle_id,
            database_url,
            log_dir: default_log_dir(),
            max_entries: DEFAULT_MAX_ENTRIES,
            flush_interval: Duration::from_secs(60),
            readiness_poll_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - DEVICE_ID (required)
    /// - BUNDLE_ID (required)
    /// - DATABASE_URL (required)
    /// - LOG_DIR (optional, default: platform data dir)
    /// - MAX_LOG_ENTRIES (optional, default: 10000)
    /// - FLUSH_INTERVAL (optional, seconds, default: 60, 0 disables)
    /// - READINESS_POLL_INTERVAL (optional, seconds, default: 30)
    /// - REQUEST_TIMEOUT (optional, seconds, default: 10)
    pub fn from_env() -> anyhow::Result<Self> {
        let device_id = std::env::var("DEVICE_ID")
            .map_err(|_| anyhow::anyhow!("DEVICE_ID environment variable not set"))?;

        let bundle_id = std::env::var("BUNDLE_ID")
            .map_err(|_| anyhow::anyhow!("BUNDLE_ID environment variable not set"))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

        let mut config = Self::new(device_id, bundle_id, database_url);

        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Some(max_entries) = env_parse::<usize>("MAX_LOG_ENTRIES") {
            config.max_entries = max_entries;
        }

        if let Some(secs) = env_parse::<u64>("FLUSH_INTERVAL") {
            config.flush_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("READINESS_POLL_INTERVAL") {
            config.readiness_poll_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("REQUEST_TIMEOUT") {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sets the pending-logs directory
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.device_id.is_empty() {
            anyhow::bail!("device_id cannot be empty");
        }

        if self.bundle_id.is_empty() {
            anyhow::bail!("bundle_id cannot be empty");
        }

        if !self.database_url.starts_with("http://") && !self.database_url.starts_with("https://")
        {
            anyhow::bail!("database_url must start with http:// or https://");
        }

        if self.max_entries == 0 {
            anyhow::bail!("max_entries must be greater than 0");
        }

        if self.readiness_poll_interval.is_zero() {
            anyhow::bail!("readiness_poll_interval must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            "logship".to_string(),
            "http://localhost:5984/logs".to_string(),
        )
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

/// `<local data dir>/logship/pending-logs`, or under the temp dir if the
/// platform has no data dir
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("logship")
        .join("pending-logs")
}
