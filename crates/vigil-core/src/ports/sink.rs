use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ErrorEntry;

/// AlertSink trait - one delivery channel for a drained batch
/// (Slack webhook, Teams webhook, SMTP email).
///
/// A sink formats the whole batch into a single channel-appropriate payload
/// and performs one outbound call per cycle, not one per entry. `send` must
/// not mutate the batch; failures are reported as `SinkError`, never raw
/// panics into the dispatch fan-out.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Channel identity used in logs and dispatch results.
    fn name(&self) -> &str;

    /// Deliver one batch to this channel.
    async fn send(&self, batch: &[ErrorEntry]) -> Result<(), SinkError>;
}

/// Delivery channel errors.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("webhook request failed: {0}")]
    Http(String),

    #[error("webhook returned status {0}")]
    Status(u16),

    #[error("smtp delivery failed: {0}")]
    Smtp(String),

    #[error("payload rendering failed: {0}")]
    Render(String),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("sink task panicked")]
    Panicked,
}
