//! Service layer
//!
//! Services contain the agent's flushing policy. They orchestrate the
//! repositories and implement buffering, readiness watching, lifecycle
//! flushes and the background loops.

pub mod background;
mod lifecycle;
mod log_buffer;
pub(crate) mod storage;
mod watcher;

// Re-export traits
pub use log_buffer::LogBufferService;

// Re-export implementations
pub use lifecycle::{LifecycleEvent, LifecycleHooks};
pub use log_buffer::InMemoryLogBuffer;
pub use storage::{DEFAULT_MAX_ENTRIES, FlushOutcome, LogStorage, LogStorageBuilder, TransferReport};
pub use watcher::ReadinessWatcher;
