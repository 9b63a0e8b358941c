//! Test doubles shared by the service tests

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::repository::{DiskRepository, FsDiskRepository, PersistedLogFile, RemoteRepository};

/// Scriptable remote store
pub struct MockRemote {
    ready: AtomicBool,
    ready_script: Mutex<VecDeque<bool>>,
    fail_writes: AtomicBool,
    failures_left: AtomicUsize,
    probes: AtomicUsize,
    writes: Mutex<Vec<Vec<u8>>>,
}

impl MockRemote {
    fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            ready_script: Mutex::new(VecDeque::new()),
            fail_writes: AtomicBool::new(false),
            failures_left: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn ready() -> Self {
        Self::new(true)
    }

    pub fn not_ready() -> Self {
        Self::new(false)
    }

    /// Every write is rejected
    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    /// The first `n` writes are rejected
    pub fn fail_first_writes(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Probe answers consumed in order before falling back to `ready`
    pub fn with_ready_script(self, script: impl IntoIterator<Item = bool>) -> Self {
        self.ready_script.lock().unwrap().extend(script);
        self
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of attempted writes, rejected ones included
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteRepository for MockRemote {
    async fn probe_ready(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match self.ready_script.lock().unwrap().pop_front() {
            Some(ready) => ready,
            None => self.ready.load(Ordering::SeqCst),
        }
    }

    async fn write(&self, document: Vec<u8>) -> Result<()> {
        self.writes.lock().unwrap().push(document);

        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("store rejected the document");
        }
        let consumed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            bail!("store rejected the document");
        }
        Ok(())
    }
}

/// Disk whose every operation fails
pub struct FailingDisk;

impl DiskRepository for FailingDisk {
    fn write(&self, _document: &[u8]) -> Result<PersistedLogFile> {
        Err(anyhow!("disk full"))
    }

    fn list(&self) -> Result<Vec<PersistedLogFile>> {
        Err(anyhow!("permission denied"))
    }

    fn read(&self, _file: &PersistedLogFile) -> Result<Vec<u8>> {
        Err(anyhow!("permission denied"))
    }

    fn delete(&self, _file: &PersistedLogFile) -> Result<()> {
        Err(anyhow!("permission denied"))
    }
}

/// Real log directory that records which threads wrote to it and can be
/// told to refuse deletes
pub struct InstrumentedDisk {
    inner: FsDiskRepository,
    fail_deletes: bool,
    write_threads: Mutex<Vec<ThreadId>>,
}

impl InstrumentedDisk {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            inner: FsDiskRepository::new(dir.as_ref()).unwrap(),
            fail_deletes: false,
            write_threads: Mutex::new(Vec::new()),
        }
    }

    /// Every delete fails and leaves the file in place
    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn write_threads(&self) -> Vec<ThreadId> {
        self.write_threads.lock().unwrap().clone()
    }
}

impl DiskRepository for InstrumentedDisk {
    fn write(&self, document: &[u8]) -> Result<PersistedLogFile> {
        self.write_threads.lock().unwrap().push(thread::current().id());
        self.inner.write(document)
    }

    fn list(&self) -> Result<Vec<PersistedLogFile>> {
        self.inner.list()
    }

    fn read(&self, file: &PersistedLogFile) -> Result<Vec<u8>> {
        self.inner.read(file)
    }

    fn delete(&self, file: &PersistedLogFile) -> Result<()> {
        if self.fail_deletes {
            bail!("{} is read-only", file.name());
        }
        self.inner.delete(file)
    }
}

/// Polls `condition` until it holds, panicking after five seconds
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
