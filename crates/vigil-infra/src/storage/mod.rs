//! Aggregation storage backends.
//!
//! All backends implement `vigil_core::ports::AlertStorage` and share the
//! same contract: at most one entry per fingerprint, counts never lost under
//! concurrency, and an atomic drain.

mod memory;

#[cfg(feature = "postgres")]
mod entity;
#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "redis")]
mod redis;

use std::sync::Arc;

use vigil_core::ports::{AlertStorage, StorageError};

pub use memory::MemoryStorage;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresStorage, PostgresStorageConfig};

#[cfg(feature = "redis")]
pub use self::redis::{RedisStorage, RedisStorageConfig};

/// Storage backend selection, resolved at startup.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Process-local aggregation. State is lost on restart.
    Memory,

    #[cfg(feature = "redis")]
    Redis(RedisStorageConfig),

    #[cfg(feature = "postgres")]
    Postgres(PostgresStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memory
    }
}

impl StorageConfig {
    /// Load the backend selection from environment variables.
    ///
    /// `VIGIL_STORAGE` picks the backend (`memory`, `redis`, `postgres`);
    /// unknown or unset values fall back to memory.
    pub fn from_env() -> Self {
        match std::env::var("VIGIL_STORAGE").as_deref() {
            #[cfg(feature = "redis")]
            Ok("redis") => Self::Redis(RedisStorageConfig::from_env()),
            #[cfg(feature = "postgres")]
            Ok("postgres") => Self::Postgres(PostgresStorageConfig::from_env()),
            _ => Self::Memory,
        }
    }
}

/// Construct the configured storage backend.
///
/// Connection failures surface here, at startup, not mid-cycle.
pub async fn build_storage(config: &StorageConfig) -> Result<Arc<dyn AlertStorage>, StorageError> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "redis")]
        StorageConfig::Redis(config) => Ok(Arc::new(RedisStorage::new(config.clone()).await?)),
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres(config) => Ok(Arc::new(PostgresStorage::new(config.clone()).await?)),
    }
}
