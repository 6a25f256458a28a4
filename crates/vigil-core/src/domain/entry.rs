use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExceptionInfo, RequestInfo};

/// One aggregated error: a fingerprint, how often it occurred since the last
/// drain, and a sample of the request that first triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub fingerprint: String,
    /// Number of occurrences since the last successful drain. Always >= 1.
    pub count: u64,
    pub exception: ExceptionInfo,
    /// First-seen request sample for this fingerprint.
    pub request: RequestInfo,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl ErrorEntry {
    /// Create a fresh entry for the first occurrence of a fingerprint.
    pub fn first(fingerprint: String, exception: ExceptionInfo, request: RequestInfo) -> Self {
        let now = Utc::now();
        Self {
            fingerprint,
            count: 1,
            exception,
            request,
            first_seen: now,
            last_seen: now,
        }
    }

    /// Record one more occurrence. The exception identity and the sample
    /// request are preserved; only the counter and `last_seen` move.
    pub fn record_occurrence(&mut self) {
        self.count += 1;
        self.last_seen = Utc::now();
    }
}

/// The set of entries drained in one flush cycle.
///
/// No cross-entry ordering is guaranteed.
pub type Batch = Vec<ErrorEntry>;
