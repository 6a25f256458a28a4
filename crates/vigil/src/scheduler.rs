//! Time-driven flush loop: drain the store, hand the batch to the
//! dispatcher, repeat.
//!
//! The loop is a single task and the flush runs inline in it, so at most
//! one flush is ever in progress. A tick that fires while a flush is still
//! running is dropped (`MissedTickBehavior::Skip`); the next flush happens
//! at the next regular interval boundary, not immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use vigil_core::ports::AlertStorage;

use crate::dispatcher::AlertDispatcher;

/// Background flush scheduler.
pub struct FlushScheduler {
    storage: Arc<dyn AlertStorage>,
    dispatcher: Arc<AlertDispatcher>,
    interval: Duration,
    shutdown_timeout: Duration,
}

impl FlushScheduler {
    pub fn new(
        storage: Arc<dyn AlertStorage>,
        dispatcher: Arc<AlertDispatcher>,
        interval: Duration,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            dispatcher,
            interval,
            shutdown_timeout,
        }
    }

    /// Start the loop on a dedicated task.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_timeout = self.shutdown_timeout;

        tracing::info!(interval = ?self.interval, "Flush scheduler started");
        let task = tokio::spawn(self.run(shutdown_rx));

        SchedulerHandle {
            task,
            shutdown: shutdown_tx,
            shutdown_timeout,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a tokio interval completes immediately; consume
        // it so the first flush waits a full interval.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.changed() => {
                    // Final best-effort flush so in-flight data is not
                    // abandoned, bounded so shutdown cannot hang.
                    if tokio::time::timeout(self.shutdown_timeout, self.run_cycle())
                        .await
                        .is_err()
                    {
                        tracing::warn!("Final flush exceeded the shutdown deadline");
                    }
                    break;
                }
            }
        }

        tracing::info!("Flush scheduler stopped");
    }

    /// One flush cycle: drain, then dispatch unless the batch is empty.
    async fn run_cycle(&self) {
        let batch = match self.storage.drain().await {
            Ok(batch) => batch,
            Err(error) => {
                // Skip dispatch for this cycle; the backend keeps whatever
                // state it is in and the next tick tries again.
                tracing::warn!(error = %error, "Drain failed, skipping this flush cycle");
                return;
            }
        };

        if batch.is_empty() {
            tracing::debug!("Nothing to flush");
            return;
        }

        let entries = batch.len();
        let result = self.dispatcher.dispatch(batch).await;

        if result.all_ok() {
            tracing::info!(
                entries,
                sinks = result.outcomes.len(),
                "Aggregated error batch dispatched"
            );
        } else {
            tracing::warn!(
                entries,
                failed = result.failures().count(),
                sinks = result.outcomes.len(),
                "Aggregated error batch dispatched with failures"
            );
        }
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
    shutdown_timeout: Duration,
}

impl SchedulerHandle {
    /// Signal the loop to stop, wait for its final flush, bounded.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);

        // Grace on top of the final-flush deadline for task teardown.
        let deadline = self.shutdown_timeout + Duration::from_secs(1);
        if tokio::time::timeout(deadline, self.task).await.is_err() {
            tracing::warn!("Flush scheduler did not stop within the shutdown deadline");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use vigil_core::domain::{ErrorEntry, ExceptionInfo, RequestInfo};
    use vigil_core::ports::{AlertSink, SinkError};
    use vigil_infra::MemoryStorage;

    use super::*;

    struct RecordingSink {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl RecordingSink {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, _batch: &[ErrorEntry]) -> Result<(), SinkError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn scheduler(
        storage: Arc<dyn AlertStorage>,
        sink: Arc<RecordingSink>,
        interval: Duration,
    ) -> SchedulerHandle {
        let dispatcher = Arc::new(AlertDispatcher::new(vec![sink], Duration::from_secs(5)));
        FlushScheduler::new(storage, dispatcher, interval, Duration::from_secs(2)).spawn()
    }

    async fn add(storage: &dyn AlertStorage, message: &str) {
        storage
            .add(
                ExceptionInfo::new("TestError", message, "at handler:10"),
                RequestInfo::new("/orders", "GET"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_store_invokes_zero_sinks() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = RecordingSink::new(Duration::ZERO);
        let handle = scheduler(storage, sink.clone(), Duration::from_millis(30));

        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.shutdown().await;

        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn pending_entries_are_flushed_on_the_tick() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = RecordingSink::new(Duration::ZERO);
        let handle = scheduler(storage.clone(), sink.clone(), Duration::from_millis(40));

        add(storage.as_ref(), "boom").await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(sink.calls() >= 1);
        assert!(storage.is_empty().await);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn overlapping_ticks_never_run_two_flushes_at_once() {
        let storage = Arc::new(MemoryStorage::new());
        // Each delivery takes three intervals.
        let sink = RecordingSink::new(Duration::from_millis(90));
        let handle = scheduler(storage.clone(), sink.clone(), Duration::from_millis(30));

        for _ in 0..10 {
            add(storage.as_ref(), "boom").await;
            tokio::time::sleep(Duration::from_millis(35)).await;
        }
        handle.shutdown().await;

        assert!(sink.calls() >= 2);
        assert_eq!(sink.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_runs_a_final_flush() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = RecordingSink::new(Duration::ZERO);
        // Interval far longer than the test; only the final flush can fire.
        let handle = scheduler(storage.clone(), sink.clone(), Duration::from_secs(3600));

        add(storage.as_ref(), "boom").await;
        handle.shutdown().await;

        assert_eq!(sink.calls(), 1);
        assert!(storage.is_empty().await);
    }
}
