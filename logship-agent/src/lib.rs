//! Logship Agent
//!
//! Buffers application log lines in memory and ships them, as JSON
//! documents, to a remote document store. When the store is not ready the
//! documents are kept on disk and replayed once it reports ready again.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Repositories: the remote store and the pending-logs directory
//! - Services: buffering, flushing policy, readiness watching, lifecycle
//!   flushes and background loops
//! - Signals and sinks: how the host application talks to the agent
//!
//! # Example
//!
//! ```no_run
//! use logship_agent::repository::{FsDiskRepository, HttpRemoteRepository};
//! use logship_agent::service::LogStorage;
//! use logship_agent::sink::LogFacade;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let facade = LogFacade::new();
//!     let storage = LogStorage::builder("device-1", "com.example.app")
//!         .remote(Arc::new(HttpRemoteRepository::new(
//!             "http://localhost:5984/logs",
//!             Duration::from_secs(10),
//!         )?))
//!         .disk(Arc::new(FsDiskRepository::new("/tmp/pending-logs")?))
//!         .facade(facade.clone())
//!         .start()?;
//!
//!     facade.log("application started");
//!     storage.stop_storing_logs();
//!     Ok(())
//! }
//! ```

pub mod config;
mod locking;
pub mod repository;
pub mod service;
pub mod signal;
pub mod sink;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use service::{FlushOutcome, LogStorage, TransferReport};
pub use signal::{LifecycleEvents, Signal, Subscription};
pub use sink::{LogFacade, LogSink};
