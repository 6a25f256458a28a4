//! The assembled pipeline: capture entry point plus the running scheduler.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use vigil_core::domain::{ExceptionInfo, RequestInfo};
use vigil_core::error::CaptureError;
use vigil_core::fingerprint;
use vigil_core::ports::{AlertSink, AlertStorage, StorageError};
use vigil_infra::{ChannelError, build_sink, build_storage};

use crate::config::PipelineConfig;
use crate::dispatcher::AlertDispatcher;
use crate::scheduler::{FlushScheduler, SchedulerHandle};

/// Startup/construction failures. All of these surface before the
/// scheduler starts; nothing here is discovered mid-cycle.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("storage initialization failed: {0}")]
    Storage(#[from] StorageError),

    #[error("channel initialization failed: {0}")]
    Channel(#[from] ChannelError),
}

/// A running error-aggregation pipeline.
///
/// Explicitly constructed and passed by handle - never a process-wide
/// global - so tests and embedders can run independent instances.
pub struct Pipeline {
    storage: Arc<dyn AlertStorage>,
    capture_timeout: Duration,
    scheduler: SchedulerHandle,
}

impl Pipeline {
    /// Build storage and sinks from configuration and start the flush loop.
    pub async fn start(config: PipelineConfig) -> Result<Self, BuildError> {
        let storage = build_storage(&config.storage).await?;

        let mut sinks: Vec<Arc<dyn AlertSink>> = Vec::with_capacity(config.channels.len());
        for channel in &config.channels {
            sinks.push(build_sink(channel)?);
        }
        if sinks.is_empty() {
            tracing::warn!("No alert channels configured; batches will be drained and discarded");
        }

        Self::with_parts(storage, sinks, &config)
    }

    /// Assemble a pipeline from already-built parts.
    ///
    /// This is the seam for custom storage backends and sinks: anything
    /// implementing the port traits plugs in here.
    pub fn with_parts(
        storage: Arc<dyn AlertStorage>,
        sinks: Vec<Arc<dyn AlertSink>>,
        config: &PipelineConfig,
    ) -> Result<Self, BuildError> {
        if config.flush_interval.is_zero() {
            return Err(BuildError::Config(
                "flush interval must be non-zero".to_string(),
            ));
        }

        let dispatcher = Arc::new(AlertDispatcher::new(sinks, config.sink_timeout));
        let scheduler = FlushScheduler::new(
            storage.clone(),
            dispatcher,
            config.flush_interval,
            config.shutdown_timeout,
        )
        .spawn();

        Ok(Self {
            storage,
            capture_timeout: config.capture_timeout,
            scheduler,
        })
    }

    /// Record one error occurrence, best-effort and silent.
    ///
    /// This is the call a host places in its own error path, so it never
    /// fails outward: storage trouble is logged and the capture dropped.
    pub async fn record(&self, exception: ExceptionInfo, request: RequestInfo) {
        if let Err(error) = self.try_record(exception, request).await {
            tracing::warn!(error = %error, "Error capture dropped");
        }
    }

    /// Record one error occurrence, reporting capture failures.
    pub async fn try_record(
        &self,
        exception: ExceptionInfo,
        request: RequestInfo,
    ) -> Result<(), CaptureError> {
        tracing::debug!(
            fingerprint = %fingerprint::fingerprint(&exception),
            error_type = %exception.type_name,
            "Recording error occurrence"
        );

        match tokio::time::timeout(self.capture_timeout, self.storage.add(exception, request))
            .await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(CaptureError::Timeout(self.capture_timeout)),
        }
    }

    /// Administrative full reset of the aggregation store.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.clear().await
    }

    /// Stop the flush loop after one final bounded drain-and-dispatch.
    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
    }
}
