//! Persistence gateway for minehost server records.
//!
//! This crate owns the two pieces of persisted state the lifecycle core touches:
//! the per-server `status` field and the append-only audit log. `FileStore` keeps
//! records as JSON files with atomic replacement and an exclusive store lock,
//! `MemoryStore` is the in-process equivalent used by tests and tooling. Both
//! implement the [`ServerStore`] trait consumed by `minehost-core`.

pub mod file;
pub mod layout;
pub mod lock;
pub mod logs;
pub mod memory;
pub mod records;

pub use file::FileStore;
pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use lock::StoreLock;
pub use logs::{LogEntry, LogKind, Transition};
pub use memory::MemoryStore;
pub use records::{
    allocate_port, Edition, NewServer, ServerId, ServerRecord, ServerStatus, PORT_RANGE_END,
    PORT_RANGE_START, RCON_PORT_OFFSET,
};

use std::path::Path;
use thiserror::Error;

/// Fsync a directory so that a preceding `rename()` is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("server not found: {0}")]
    ServerNotFound(String),
    #[error("invalid server id: {0}")]
    InvalidId(String),
    #[error("invalid server record: {0}")]
    InvalidRecord(String),
    #[error("integrity check failed for server '{id}': expected {expected}, got {actual}")]
    IntegrityFailure {
        id: String,
        expected: String,
        actual: String,
    },
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("no free game port left in {start}..={end}")]
    PortsExhausted { start: u16, end: u16 },
    #[error("lock acquisition failed: {0}")]
    LockFailed(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Capability the lifecycle core needs from persistence.
///
/// Implementations must make [`commit`](Self::commit) atomic with respect to
/// other writers: the status change and its log entry land together or not at
/// all from the point of view of a concurrent reader of the same store.
pub trait ServerStore: Send + Sync {
    /// Load one record. Unknown ids yield [`StoreError::ServerNotFound`].
    fn get(&self, id: &ServerId) -> Result<ServerRecord, StoreError>;

    /// All records owned by `owner`, newest first.
    fn list(&self, owner: &str) -> Result<Vec<ServerRecord>, StoreError>;

    /// Insert a new record, allocating its id and ports.
    fn register(&self, new: &NewServer) -> Result<ServerRecord, StoreError>;

    /// Apply an optional status change and append one log entry.
    fn commit(&self, id: &ServerId, transition: &Transition) -> Result<(), StoreError>;

    /// Most recent log entries for a server, newest first.
    fn logs(&self, id: &ServerId, limit: usize) -> Result<Vec<LogEntry>, StoreError>;
}
