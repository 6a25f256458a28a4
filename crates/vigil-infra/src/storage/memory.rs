//! In-memory aggregation storage - the default backend.
//!
//! State is per-process and lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use vigil_core::domain::{Batch, ErrorEntry, ExceptionInfo, RequestInfo};
use vigil_core::fingerprint::fingerprint;
use vigil_core::ports::{AlertStorage, StorageError};

/// In-memory store keyed by fingerprint.
///
/// Adds and drains both go through the write lock, so an add lands either
/// wholly before a drain (in the drained batch) or wholly after it (as a
/// fresh entry). Two adds racing on the same fingerprint serialize on the
/// lock and both increments are kept.
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, ErrorEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct fingerprints currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStorage for MemoryStorage {
    async fn add(
        &self,
        exception: ExceptionInfo,
        request: RequestInfo,
    ) -> Result<(), StorageError> {
        let key = fingerprint(&exception);

        let mut entries = self.entries.write().await;
        match entries.get_mut(&key) {
            Some(entry) => entry.record_occurrence(),
            None => {
                entries.insert(key.clone(), ErrorEntry::first(key, exception, request));
            }
        }

        Ok(())
    }

    async fn drain(&self) -> Result<Batch, StorageError> {
        let mut entries = self.entries.write().await;
        let drained = std::mem::take(&mut *entries);
        Ok(drained.into_values().collect())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
