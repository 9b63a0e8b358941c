//! Log ingestion sinks
//!
//! The host application logs through a [`LogFacade`]: a slot holding the
//! currently installed [`LogSink`]. A running [`LogStorage`] installs a
//! [`BufferedLogSink`] into the facade when it starts and removes it when it
//! stops, after which log calls go nowhere.

use std::sync::{Arc, RwLock, Weak};

use chrono::Utc;

use crate::locking::{read, write};
use crate::service::LogStorage;
use crate::service::storage::StorageInner;

/// Trait for log sinks
///
/// # Thread Safety
/// Sinks are called concurrently from arbitrary application threads.
pub trait LogSink: Send + Sync {
    /// Write a log message
    fn write(&self, message: &str);
}

/// The host-facing logging entry point
///
/// Clones share the same slot.
#[derive(Clone, Default)]
pub struct LogFacade {
    slot: Arc<RwLock<Option<Arc<dyn LogSink>>>>,
}

impl LogFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `sink`, returning the one it replaces
    pub fn install(&self, sink: Arc<dyn LogSink>) -> Option<Arc<dyn LogSink>> {
        write(&self.slot).replace(sink)
    }

    /// Removes the installed sink
    pub fn remove(&self) -> Option<Arc<dyn LogSink>> {
        write(&self.slot).take()
    }

    pub fn has_sink(&self) -> bool {
        read(&self.slot).is_some()
    }

    /// Forwards `message` to the installed sink; a no-op without one
    pub fn log(&self, message: &str) {
        let sink = read(&self.slot).clone();
        if let Some(sink) = sink {
            sink.write(message);
        }
    }
}

/// Sink that appends to a [`LogStorage`] buffer
///
/// Holds a weak reference: once the storage is gone, writes are dropped.
pub struct BufferedLogSink {
    storage: Weak<StorageInner>,
}

impl BufferedLogSink {
    pub(crate) fn new(storage: Weak<StorageInner>) -> Self {
        Self { storage }
    }
}

impl LogSink for BufferedLogSink {
    fn write(&self, message: &str) {
        if let Some(storage) = LogStorage::upgrade(&self.storage) {
            storage.append(message, Utc::now());
        }
    }
}
