//! Log storage service
//!
//! Owns the in-memory buffer and decides where each flushed batch goes:
//! - Remote store ready: the document is posted directly
//! - Remote store not ready: the document is written to disk and the
//!   readiness watcher is armed
//! - Readiness signal fires: every document on disk is transferred to the
//!   remote store and deleted once the store acknowledged it
//!
//! Delivery is at-least-once. Nothing here ever returns an error to the code
//! that logs; failures are reported through `tracing` and [`FlushOutcome`].

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use logship_core::{LogEntry, encode_entries};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;
use tokio::task;
use tracing::{debug, error, info, trace, warn};

use crate::locking::lock;
use crate::repository::{DiskRepository, PersistedLogFile, RemoteRepository};
use crate::service::lifecycle::LifecycleHooks;
use crate::service::log_buffer::{InMemoryLogBuffer, LogBufferService};
use crate::service::watcher::ReadinessWatcher;
use crate::signal::{LifecycleEvents, Signal};
use crate::sink::{BufferedLogSink, LogFacade};

/// Default buffer length that triggers a flush
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Where a flushed batch ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered
    Empty,
    /// The batch could not be encoded and was dropped
    Discarded,
    /// The remote store acknowledged the document
    DeliveredRemote,
    /// The store looked ready but rejected the write; the batch was dropped
    RemoteFailed,
    /// The document was written to disk for a later transfer
    SavedToDisk(PersistedLogFile),
    /// Disk was the last resort and it failed; the batch was dropped
    DiskFailed,
}

/// Result of one disk-to-remote transfer pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Documents the remote store acknowledged
    pub delivered: usize,
    /// Documents left on disk because they could not be read or stored
    pub failed: usize,
    /// Delivered documents whose local copy could not be removed
    pub undeleted: usize,
}

impl TransferReport {
    /// Whether files remain on disk that a later pass should pick up
    pub fn has_leftovers(&self) -> bool {
        self.failed > 0 || self.undeleted > 0
    }
}

/// Builder for [`LogStorage`]
pub struct LogStorageBuilder {
    device_id: String,
    bundle_id: String,
    max_entries: usize,
    remote: Option<Arc<dyn RemoteRepository>>,
    disk: Option<Arc<dyn DiskRepository>>,
    readiness: Option<Signal>,
    lifecycle: Option<LifecycleEvents>,
    facade: Option<LogFacade>,
}

impl LogStorageBuilder {
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteRepository>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn disk(mut self, disk: Arc<dyn DiskRepository>) -> Self {
        self.disk = Some(disk);
        self
    }

    /// Signal that fires when the remote store becomes ready
    pub fn readiness(mut self, signal: Signal) -> Self {
        self.readiness = Some(signal);
        self
    }

    /// Host lifecycle notifications that force an immediate disk flush
    pub fn lifecycle(mut self, events: LifecycleEvents) -> Self {
        self.lifecycle = Some(events);
        self
    }

    /// Facade the storage installs its sink into
    pub fn facade(mut self, facade: LogFacade) -> Self {
        self.facade = Some(facade);
        self
    }

    /// Starts storing logs
    ///
    /// Must be called from within a tokio runtime; background flushes and
    /// transfers are spawned onto it.
    pub fn start(self) -> Result<LogStorage> {
        let runtime =
            Handle::try_current().context("LogStorage must be started inside a tokio runtime")?;
        let remote = self.remote.context("No remote repository configured")?;
        let disk = self.disk.context("No disk repository configured")?;

        if self.max_entries == 0 {
            bail!("max_entries must be greater than 0");
        }

        let storage = LogStorage {
            inner: Arc::new(StorageInner {
                device_id: self.device_id,
                bundle_id: self.bundle_id,
                max_entries: self.max_entries,
                buffer: Box::new(InMemoryLogBuffer::new()),
                remote,
                disk,
                watcher: ReadinessWatcher::new(
                    self.readiness.unwrap_or_else(|| Signal::new("remote-ready")),
                ),
                lifecycle: Mutex::new(None),
                facade: self.facade,
                runtime,
                stopped: AtomicBool::new(false),
            }),
        };

        if let Some(events) = &self.lifecycle {
            let weak = Arc::downgrade(&storage.inner);
            let hooks = LifecycleHooks::install(events, move |event| {
                if let Some(storage) = LogStorage::upgrade(&weak) {
                    debug!("Received {}, flushing logs to disk", event);
                    storage.persist_to_disk_now();
                }
            });
            *lock(&storage.inner.lifecycle) = Some(hooks);
        }

        if let Some(facade) = &storage.inner.facade {
            let sink = BufferedLogSink::new(Arc::downgrade(&storage.inner));
            facade.install(Arc::new(sink));
        }

        if storage.inner.disk.has_any() {
            info!("Found persisted logs from a previous run, waiting for the remote store");
            storage.arm_watcher();
        }

        info!(
            "Storing logs (device_id={}, max_entries={})",
            storage.inner.device_id, storage.inner.max_entries
        );
        Ok(storage)
    }
}

pub(crate) struct StorageInner {
    device_id: String,
    bundle_id: String,
    max_entries: usize,
    buffer: Box<dyn LogBufferService>,
    remote: Arc<dyn RemoteRepository>,
    disk: Arc<dyn DiskRepository>,
    watcher: ReadinessWatcher,
    lifecycle: Mutex<Option<LifecycleHooks>>,
    facade: Option<LogFacade>,
    runtime: Handle,
    stopped: AtomicBool,
}

impl StorageInner {
    fn encode(&self, entries: &[LogEntry]) -> Option<Vec<u8>> {
        match encode_entries(&self.device_id, &self.bundle_id, entries) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("Discarding {} log entries: {}", entries.len(), e);
                None
            }
        }
    }

    fn write_to_disk(&self, bytes: &[u8]) -> FlushOutcome {
        write_document(self.disk.as_ref(), bytes)
    }
}

fn write_document(disk: &dyn DiskRepository, bytes: &[u8]) -> FlushOutcome {
    match disk.write(bytes) {
        Ok(file) => FlushOutcome::SavedToDisk(file),
        Err(e) => {
            error!("Dropping {} byte log document: {:#}", bytes.len(), e);
            FlushOutcome::DiskFailed
        }
    }
}

impl Drop for StorageInner {
    fn drop(&mut self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        // Dropped without stop_storing_logs: keep what is still buffered
        let entries = self.buffer.drain();
        if !entries.is_empty() {
            if let Some(bytes) = self.encode(&entries) {
                self.write_to_disk(&bytes);
            }
        }
        if let Some(facade) = &self.facade {
            facade.remove();
        }
    }
}

/// Buffers log entries and persists them to the remote store or disk
///
/// Cheap to clone; clones share the same buffer.
#[derive(Clone)]
pub struct LogStorage {
    inner: Arc<StorageInner>,
}

impl LogStorage {
    pub fn builder(device_id: impl Into<String>, bundle_id: impl Into<String>) -> LogStorageBuilder {
        LogStorageBuilder {
            device_id: device_id.into(),
            bundle_id: bundle_id.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
            remote: None,
            disk: None,
            readiness: None,
            lifecycle: None,
            facade: None,
        }
    }

    pub(crate) fn upgrade(weak: &Weak<StorageInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Appends one entry, flushing in the background once the buffer is full
    pub fn append(&self, message: impl Into<String>, timestamp: DateTime<Utc>) {
        if self.is_stopped() {
            trace!("Ignoring log entry appended after stop");
            return;
        }

        self.persist_if_needed(LogEntry::new(message, timestamp));

        if self.is_stopped() {
            // Raced with stop_storing_logs; don't strand the entry
            self.persist_to_disk_now();
        }
    }

    /// Appends one entry stamped with the current time
    pub fn log(&self, message: impl Into<String>) {
        self.append(message, Utc::now());
    }

    fn persist_if_needed(&self, entry: LogEntry) {
        let Some(batch) = self.inner.buffer.add_entry(entry, self.inner.max_entries) else {
            return;
        };

        debug!("Buffer reached {} entries, flushing", batch.len());
        let storage = self.clone();
        self.inner.runtime.spawn(async move {
            storage.persist(batch).await;
        });
    }

    /// Drains the buffer and persists it, reporting where it ended up
    pub async fn flush(&self) -> FlushOutcome {
        let entries = self.inner.buffer.drain();
        self.persist(entries).await
    }

    /// Persists one batch: remote if the store is ready, otherwise disk
    pub async fn persist(&self, entries: Vec<LogEntry>) -> FlushOutcome {
        if entries.is_empty() {
            return FlushOutcome::Empty;
        }
        let Some(bytes) = self.inner.encode(&entries) else {
            return FlushOutcome::Discarded;
        };

        if self.inner.remote.probe_ready().await {
            match self.inner.remote.write(bytes).await {
                Ok(()) => {
                    debug!("Stored {} log entries remotely", entries.len());
                    FlushOutcome::DeliveredRemote
                }
                Err(e) => {
                    warn!("Dropping {} log entries: {:#}", entries.len(), e);
                    FlushOutcome::RemoteFailed
                }
            }
        } else {
            debug!(
                "Remote store not ready, writing {} log entries to disk",
                entries.len()
            );
            // File writes end in sync_all; keep them off the async workers
            let disk = Arc::clone(&self.inner.disk);
            let outcome =
                match task::spawn_blocking(move || write_document(disk.as_ref(), &bytes)).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Disk write task failed: {}", e);
                        FlushOutcome::DiskFailed
                    }
                };
            self.arm_watcher();
            outcome
        }
    }

    /// Drains the buffer straight to disk without contacting the remote store
    ///
    /// Used when the host is about to be suspended or is short on memory.
    pub fn persist_to_disk_now(&self) -> FlushOutcome {
        let entries = self.inner.buffer.drain();
        if entries.is_empty() {
            return FlushOutcome::Empty;
        }
        let Some(bytes) = self.inner.encode(&entries) else {
            return FlushOutcome::Discarded;
        };

        let outcome = self.inner.write_to_disk(&bytes);
        self.arm_watcher();
        outcome
    }

    /// Moves every document on disk to the remote store
    ///
    /// Files are handled independently; a file that cannot be delivered stays
    /// on disk and the watcher is re-armed so the next readiness signal
    /// retries it.
    pub async fn transfer_logs_from_disk_to_database(&self) -> TransferReport {
        let mut report = TransferReport::default();

        let files = match self.inner.disk.list() {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list persisted logs: {:#}", e);
                return report;
            }
        };

        for file in files {
            let bytes = match self.inner.disk.read(&file) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping {}: {:#}", file.name(), e);
                    report.failed += 1;
                    continue;
                }
            };

            if let Err(e) = self.inner.remote.write(bytes).await {
                warn!("Keeping {} on disk: {:#}", file.name(), e);
                report.failed += 1;
                continue;
            }

            report.delivered += 1;
            if let Err(e) = self.inner.disk.delete(&file) {
                warn!("Delivered {} but could not remove it: {:#}", file.name(), e);
                report.undeleted += 1;
            }
        }

        info!(
            "Transferred {} persisted log document(s), {} left for later",
            report.delivered,
            report.failed + report.undeleted
        );

        if report.has_leftovers() {
            self.arm_watcher();
        }
        report
    }

    fn arm_watcher(&self) {
        if self.is_stopped() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let armed = self.inner.watcher.arm(move || {
            let Some(storage) = LogStorage::upgrade(&weak) else {
                return;
            };
            if !storage.inner.watcher.disarm() {
                return;
            }

            info!("Remote store is ready, transferring persisted logs");
            let runtime = storage.inner.runtime.clone();
            runtime.spawn(async move {
                storage.transfer_logs_from_disk_to_database().await;
            });
        });

        // stop_storing_logs may have disarmed between the check above and arm
        if armed && self.is_stopped() {
            self.inner.watcher.disarm();
        }
    }

    /// Stops storing logs and writes whatever is still buffered to disk
    ///
    /// Unhooks the sink and every subscription. Later appends are ignored.
    pub fn stop_storing_logs(&self) -> FlushOutcome {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return FlushOutcome::Empty;
        }

        if let Some(facade) = &self.inner.facade {
            facade.remove();
        }
        lock(&self.inner.lifecycle).take();
        self.inner.watcher.disarm();

        let outcome = self.persist_to_disk_now();
        info!("Stopped storing logs ({:?})", outcome);
        outcome
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    pub fn buffered_len(&self) -> usize {
        self.inner.buffer.len()
    }

    pub fn is_watching_for_readiness(&self) -> bool {
        self.inner.watcher.is_armed()
    }

    /// Signal the watcher listens to
    pub fn readiness_signal(&self) -> &Signal {
        self.inner.watcher.signal()
    }
}
