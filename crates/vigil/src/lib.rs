//! # Vigil
//!
//! Deduplicates and batches application error events, then fans them out to
//! configured notification channels on a timer.
//!
//! Errors are fingerprinted by message and stack trace, aggregated in a
//! pluggable store (in-memory, Redis, or Postgres), drained atomically on a
//! fixed interval, and delivered concurrently to every configured sink
//! (Slack, Teams, SMTP email) with per-sink fault isolation.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vigil::{ChannelConfig, ExceptionInfo, Pipeline, PipelineConfig, RequestInfo};
//!
//! # async fn example() -> Result<(), vigil::BuildError> {
//! let config = PipelineConfig {
//!     flush_interval: Duration::from_secs(60),
//!     channels: vec![ChannelConfig::Slack {
//!         webhook_url: "https://hooks.slack.com/services/T/B/X".to_string(),
//!         dashboard_url: None,
//!     }],
//!     ..PipelineConfig::default()
//! };
//!
//! let pipeline = Pipeline::start(config).await?;
//!
//! // In the host's error path:
//! pipeline
//!     .record(
//!         ExceptionInfo::new("TimeoutError", "db timeout", "at query:42"),
//!         RequestInfo::new("/orders", "GET"),
//!     )
//!     .await;
//!
//! // On service shutdown:
//! pipeline.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod pipeline;
pub mod scheduler;

pub use config::PipelineConfig;
pub use dispatcher::{AlertDispatcher, DispatchResult, SinkOutcome};
pub use pipeline::{BuildError, Pipeline};
pub use scheduler::{FlushScheduler, SchedulerHandle};

// Domain and port re-exports for embedders.
pub use vigil_core::domain::{Batch, ErrorEntry, ExceptionInfo, RequestInfo};
pub use vigil_core::error::CaptureError;
pub use vigil_core::fingerprint::fingerprint;
pub use vigil_core::ports::{AlertSink, AlertStorage, SinkError, StorageError};
pub use vigil_infra::{ChannelConfig, ChannelError, MemoryStorage, StorageConfig};
