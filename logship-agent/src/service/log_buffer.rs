//! Log buffer service
//!
//! Manages in-memory log collection between flushes.
//! Entries are appended from arbitrary threads and drained in one atomic
//! step, so every entry ends up in exactly one flushed batch.

use logship_core::LogEntry;
use std::sync::{Arc, Mutex};

use crate::locking::lock;

/// Service for managing log buffers
pub trait LogBufferService: Send + Sync {
    /// Adds a log entry to the buffer
    ///
    /// If the buffer holds `threshold` or more entries afterwards, the whole
    /// buffer is drained in the same critical section and returned.
    ///
    /// # Arguments
    /// * `entry` - The log entry to add
    /// * `threshold` - Buffer length that triggers a drain
    fn add_entry(&self, entry: LogEntry, threshold: usize) -> Option<Vec<LogEntry>>;

    /// Drains all log entries from the buffer
    ///
    /// # Returns
    /// Every buffered entry, in append order
    fn drain(&self) -> Vec<LogEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory implementation of LogBufferService
///
/// Uses Arc<Mutex<Vec<LogEntry>>> for thread-safe access across tasks.
#[derive(Clone)]
pub struct InMemoryLogBuffer {
    buffer: Arc<Mutex<Vec<LogEntry>>>,
}

impl InMemoryLogBuffer {
    /// Creates a new in-memory log buffer
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for InMemoryLogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBufferService for InMemoryLogBuffer {
    fn add_entry(&self, entry: LogEntry, threshold: usize) -> Option<Vec<LogEntry>> {
        let mut buffer = lock(&self.buffer);
        buffer.push(entry);

        if buffer.len() >= threshold {
            Some(std::mem::take(&mut *buffer))
        } else {
            None
        }
    }

    fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *lock(&self.buffer))
    }

    fn len(&self) -> usize {
        lock(&self.buffer).len()
    }
}
