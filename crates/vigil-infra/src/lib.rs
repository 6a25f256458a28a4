//! # Vigil Infrastructure
//!
//! Concrete implementations of the ports defined in `vigil-core`:
//! aggregation storage backends and alert delivery sinks.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All backends and channels enabled
//! - `minimal` - In-memory storage and webhook sinks only
//! - `postgres` - Relational storage via SeaORM
//! - `redis` - Redis-backed storage
//! - `smtp` - Email delivery via lettre

pub mod sinks;
pub mod storage;

// Re-exports - Storage
pub use storage::{MemoryStorage, StorageConfig, build_storage};

#[cfg(feature = "redis")]
pub use storage::{RedisStorage, RedisStorageConfig};

#[cfg(feature = "postgres")]
pub use storage::{PostgresStorage, PostgresStorageConfig};

// Re-exports - Sinks
pub use sinks::{ChannelConfig, ChannelError, SlackSink, TeamsSink, build_sink};

#[cfg(feature = "smtp")]
pub use sinks::{EmailSettings, EmailSink};
