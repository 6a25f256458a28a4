use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Batch, ExceptionInfo, RequestInfo};

/// AlertStorage trait - abstraction over aggregation backends
/// (in-memory, Redis, Postgres).
///
/// Implementations must be safe under unbounded concurrent `add` calls:
/// concurrent adds to the same fingerprint never lose an increment, and a
/// `drain` is atomic relative to concurrent adds - every in-flight add lands
/// either in the drained batch or in the next one, never both, never neither.
#[async_trait]
pub trait AlertStorage: Send + Sync {
    /// Record one occurrence of an error.
    ///
    /// The first add for a fingerprint creates the entry and retains the
    /// request as the sample; later adds only increment the count and move
    /// `last_seen`.
    async fn add(&self, exception: ExceptionInfo, request: RequestInfo)
    -> Result<(), StorageError>;

    /// Atomically capture all current entries and empty the store.
    ///
    /// No entry is returned twice across two drains, and no add issued
    /// during a drain is silently lost.
    async fn drain(&self) -> Result<Batch, StorageError>;

    /// Administrative full reset.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Storage backend errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("backend operation failed: {0}")]
    Backend(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}
