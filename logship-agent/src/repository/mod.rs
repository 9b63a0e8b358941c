//! Repository layer
//!
//! Repositories are the two persistence tiers a log document can land in:
//! the remote document store and the local pending-logs directory. They
//! expose small, focused interfaces without any flushing policy; choosing
//! between them is the storage service's job.
//!
//! All repositories are trait-based to enable testing and mocking.

mod disk;
mod remote;

// Re-export traits
pub use disk::DiskRepository;
pub use remote::RemoteRepository;

// Re-export implementations
pub use disk::{FsDiskRepository, PersistedLogFile};
pub use remote::HttpRemoteRepository;
