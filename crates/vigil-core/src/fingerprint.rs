//! Error fingerprinting for deduplication.
//!
//! The fingerprint is a SHA-256 hash over the error message and stack trace,
//! so "the same bug" groups together across different requests. Request
//! URL, method, and headers deliberately never participate.

use sha2::{Digest, Sha256};

use crate::domain::ExceptionInfo;

/// Compute the stable identity of an error.
///
/// Deterministic and pure: two errors with identical message and stack
/// trace always map to the same fingerprint. A missing stack trace hashes
/// as the empty string. Returns a 64-character hex digest.
#[must_use]
pub fn fingerprint(exception: &ExceptionInfo) -> String {
    // NUL delimiter prevents ("ab", "c") from colliding with ("a", "bc").
    const DELIMITER: &[u8] = b"\x00";

    let mut hasher = Sha256::new();
    hasher.update(exception.message.as_bytes());
    hasher.update(DELIMITER);
    hasher.update(exception.stack_trace.as_bytes());
    hex::encode(hasher.finalize())
}
