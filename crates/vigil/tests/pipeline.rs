//! End-to-end pipeline tests against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigil::{
    AlertDispatcher, AlertSink, ErrorEntry, ExceptionInfo, MemoryStorage, Pipeline,
    PipelineConfig, RequestInfo, SinkError,
};
use vigil_infra::SlackSink;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Captures every batch it is handed, as (message, count) pairs.
struct CapturingSink {
    batches: Mutex<Vec<Vec<(String, u64)>>>,
}

impl CapturingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(Vec::new()),
        })
    }

    async fn batches(&self) -> Vec<Vec<(String, u64)>> {
        self.batches.lock().await.clone()
    }
}

#[async_trait]
impl AlertSink for CapturingSink {
    fn name(&self) -> &str {
        "capturing"
    }

    async fn send(&self, batch: &[ErrorEntry]) -> Result<(), SinkError> {
        let mut summary: Vec<(String, u64)> = batch
            .iter()
            .map(|entry| (entry.exception.message.clone(), entry.count))
            .collect();
        summary.sort();
        self.batches.lock().await.push(summary);
        Ok(())
    }
}

fn exception(message: &str) -> ExceptionInfo {
    ExceptionInfo::new("TestError", message, "at handler:10")
}

fn request(url: &str) -> RequestInfo {
    RequestInfo::new(url, "GET")
}

fn config(flush_interval: Duration) -> PipelineConfig {
    PipelineConfig {
        flush_interval,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn batch_aggregates_by_fingerprint_and_store_is_empty_after_drain() {
    init_tracing();
    let storage = Arc::new(MemoryStorage::new());
    let sink = CapturingSink::new();
    let pipeline = Pipeline::with_parts(
        storage.clone(),
        vec![sink.clone()],
        &config(Duration::from_millis(60)),
    )
    .unwrap();

    for _ in 0..3 {
        pipeline.record(exception("error A"), request("/a")).await;
    }
    pipeline.record(exception("error B"), request("/b")).await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    let batches = sink.batches().await;
    assert_eq!(batches.len(), 1, "one flush cycle should have dispatched");
    assert_eq!(
        batches[0],
        vec![("error A".to_string(), 3), ("error B".to_string(), 1)]
    );
    assert!(storage.is_empty().await);

    pipeline.shutdown().await;
}

#[tokio::test]
async fn concurrent_records_of_the_same_error_are_all_counted() {
    let storage = Arc::new(MemoryStorage::new());
    let sink = CapturingSink::new();
    let pipeline = Arc::new(
        Pipeline::with_parts(
            storage,
            vec![sink.clone()],
            &config(Duration::from_secs(3600)),
        )
        .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..32 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline.record(exception("same bug"), request("/x")).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let pipeline = Arc::into_inner(pipeline).unwrap();
    pipeline.shutdown().await;

    let batches = sink.batches().await;
    assert_eq!(batches, vec![vec![("same bug".to_string(), 32)]]);
}

#[tokio::test]
async fn shutdown_flushes_pending_entries_before_stopping() {
    let storage = Arc::new(MemoryStorage::new());
    let sink = CapturingSink::new();
    let pipeline = Pipeline::with_parts(
        storage.clone(),
        vec![sink.clone()],
        &config(Duration::from_secs(3600)),
    )
    .unwrap();

    pipeline.record(exception("boom"), request("/x")).await;
    pipeline.shutdown().await;

    assert_eq!(sink.batches().await.len(), 1);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn zero_flush_interval_is_rejected_at_startup() {
    let result = Pipeline::with_parts(
        Arc::new(MemoryStorage::new()),
        Vec::new(),
        &config(Duration::ZERO),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn unreachable_webhook_reports_a_failed_outcome_without_panicking() {
    init_tracing();
    // Nothing listens on this port; the POST fails with connection refused.
    let slack = SlackSink::new("http://127.0.0.1:9/webhook".to_string(), None).unwrap();
    let dispatcher = AlertDispatcher::new(
        vec![Arc::new(slack) as Arc<dyn AlertSink>],
        Duration::from_secs(2),
    );

    let batch = vec![ErrorEntry::first(
        "fp".to_string(),
        exception("boom"),
        request("/x"),
    )];
    let result = dispatcher.dispatch(batch).await;

    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].sink, "slack");
    assert!(result.outcomes[0].result.is_err());
}
