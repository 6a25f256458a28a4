//! Redis-backed aggregation storage.
//!
//! Occurrences are appended to a single list key as JSON events; the
//! aggregation by fingerprint happens at drain time. The drain runs
//! `LRANGE` + `DEL` inside one `MULTI`/`EXEC`, so an event pushed while a
//! drain executes lands either in the drained range or survives for the
//! next cycle - never both.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};

use vigil_core::domain::{Batch, ErrorEntry, ExceptionInfo, RequestInfo};
use vigil_core::fingerprint::fingerprint;
use vigil_core::ports::{AlertStorage, StorageError};

/// Redis storage configuration.
#[derive(Debug, Clone)]
pub struct RedisStorageConfig {
    /// Redis URL (e.g. redis://localhost:6379)
    pub url: String,
    /// List key holding pending error events.
    pub key: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for RedisStorageConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key: "vigil:error-batch".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisStorageConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("VIGIL_REDIS_URL").unwrap_or(defaults.url),
            key: std::env::var("VIGIL_REDIS_KEY").unwrap_or(defaults.key),
            connect_timeout: Duration::from_secs(
                std::env::var("VIGIL_REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// One occurrence as stored on the Redis list.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEvent {
    fingerprint: String,
    exception: ExceptionInfo,
    request: RequestInfo,
    at: DateTime<Utc>,
}

/// Redis-backed aggregation store.
///
/// Uses a connection manager for automatic reconnection.
pub struct RedisStorage {
    conn: ConnectionManager,
    key: String,
}

impl RedisStorage {
    pub async fn new(config: RedisStorageConfig) -> Result<Self, StorageError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Bounded wait so an unreachable Redis fails at startup, not forever.
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StorageError::Timeout(config.connect_timeout))?
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, key = %config.key, "Connected to Redis alert storage");

        Ok(Self {
            conn,
            key: config.key,
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StorageError> {
        Self::new(RedisStorageConfig::from_env()).await
    }

    /// Fold the chronological event list into one entry per fingerprint.
    ///
    /// Events are in push order, so the first event seen for a fingerprint
    /// carries the sample request and `first_seen`. The drain has already
    /// deleted the list by the time this runs, so an undecodable event is
    /// skipped and logged; failing here would throw away the valid events
    /// alongside it.
    fn aggregate(events: Vec<String>) -> Batch {
        let mut entries: HashMap<String, ErrorEntry> = HashMap::new();

        for raw in events {
            let event: StoredEvent = match serde_json::from_str(&raw) {
                Ok(event) => event,
                Err(error) => {
                    tracing::warn!(error = %error, "Skipping undecodable stored event");
                    continue;
                }
            };

            match entries.get_mut(&event.fingerprint) {
                Some(entry) => {
                    entry.count += 1;
                    entry.last_seen = event.at;
                }
                None => {
                    entries.insert(
                        event.fingerprint.clone(),
                        ErrorEntry {
                            fingerprint: event.fingerprint,
                            count: 1,
                            exception: event.exception,
                            request: event.request,
                            first_seen: event.at,
                            last_seen: event.at,
                        },
                    );
                }
            }
        }

        entries.into_values().collect()
    }
}

#[async_trait]
impl AlertStorage for RedisStorage {
    async fn add(
        &self,
        exception: ExceptionInfo,
        request: RequestInfo,
    ) -> Result<(), StorageError> {
        let event = StoredEvent {
            fingerprint: fingerprint(&exception),
            exception,
            request,
            at: Utc::now(),
        };
        let payload = serde_json::to_string(&event)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(&self.key, payload)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn drain(&self) -> Result<Batch, StorageError> {
        let mut conn = self.conn.clone();

        // LRANGE + DEL under MULTI/EXEC: reads exactly the events it deletes.
        let (events, _deleted): (Vec<String>, i64) = redis::pipe()
            .atomic()
            .lrange(&self.key, 0, -1)
            .del(&self.key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(Self::aggregate(events))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&self.key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }
}
