//! Capture-path error type.

use std::time::Duration;

use thiserror::Error;

use crate::ports::StorageError;

/// Failure while recording an error into the aggregation store.
///
/// The capture path runs inside the host application's own error handling,
/// so these are logged and dropped rather than propagated - a lost capture
/// is preferable to destabilizing request handling.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("storage write failed: {0}")]
    Storage(#[from] StorageError),

    #[error("capture timed out after {0:?}")]
    Timeout(Duration),
}
