//! Fault-isolated fan-out of a drained batch to all configured sinks.

use std::sync::Arc;
use std::time::Duration;

use vigil_core::domain::Batch;
use vigil_core::ports::{AlertSink, SinkError};

/// The outcome of one sink's delivery attempt.
#[derive(Debug)]
pub struct SinkOutcome {
    /// Channel identity (`AlertSink::name`).
    pub sink: String,
    pub result: Result<(), SinkError>,
}

/// Per-sink outcomes for one dispatched batch.
#[derive(Debug)]
pub struct DispatchResult {
    pub outcomes: Vec<SinkOutcome>,
}

impl DispatchResult {
    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SinkOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
    }
}

/// Fans a batch out to every configured sink concurrently.
///
/// Each sink runs in its own task under its own timeout, so one sink's
/// failure, hang, or panic never prevents or delays delivery to the others.
/// Failed deliveries are reported, never retried, and the batch is never
/// re-queued.
pub struct AlertDispatcher {
    sinks: Vec<Arc<dyn AlertSink>>,
    sink_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>, sink_timeout: Duration) -> Self {
        Self {
            sinks,
            sink_timeout,
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver one batch to every sink and wait for all of them.
    ///
    /// Never returns an error and never panics; every sink's fate is
    /// recorded in the result.
    pub async fn dispatch(&self, batch: Batch) -> DispatchResult {
        let batch = Arc::new(batch);
        let mut tasks = Vec::with_capacity(self.sinks.len());

        for sink in &self.sinks {
            let sink = sink.clone();
            let batch = batch.clone();
            let timeout = self.sink_timeout;
            let name = sink.name().to_string();

            // Spawned so a panicking sink is contained by the task boundary.
            let task = tokio::spawn(async move {
                match tokio::time::timeout(timeout, sink.send(&batch)).await {
                    Ok(result) => result,
                    Err(_) => Err(SinkError::Timeout(timeout)),
                }
            });
            tasks.push((name, task));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (sink, task) in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    tracing::error!(sink = %sink, error = %join_error, "Sink task aborted");
                    Err(SinkError::Panicked)
                }
            };
            if let Err(error) = &result {
                tracing::warn!(sink = %sink, error = %error, "Alert delivery failed");
            }
            outcomes.push(SinkOutcome { sink, result });
        }

        DispatchResult { outcomes }
    }
}
