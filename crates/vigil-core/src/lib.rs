//! # Vigil Core
//!
//! The domain layer of the Vigil error-alerting pipeline.
//! This crate contains the error data model, fingerprinting, and the port
//! traits that storage backends and alert sinks implement. It has zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod ports;

pub use domain::{Batch, ErrorEntry, ExceptionInfo, RequestInfo};
pub use error::CaptureError;
