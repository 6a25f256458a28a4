use serde::{Deserialize, Serialize};

/// Eagerly captured exception details.
///
/// The pipeline never holds a live error object: everything that matters is
/// copied into this value at capture time so entries survive serialization
/// to a remote store and reconstruction on drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    /// Short type name of the error (e.g. `TimeoutError`).
    pub type_name: String,
    pub message: String,
    /// May be empty when no backtrace was available.
    pub stack_trace: String,
}

impl ExceptionInfo {
    pub fn new(
        type_name: impl Into<String>,
        message: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace: stack_trace.into(),
        }
    }

    /// Capture a `std::error::Error` without a stack trace.
    pub fn from_error<E: std::error::Error>(error: &E) -> Self {
        Self {
            type_name: std::any::type_name::<E>()
                .rsplit("::")
                .next()
                .unwrap_or("Error")
                .to_string(),
            message: error.to_string(),
            stack_trace: String::new(),
        }
    }
}

/// The request that triggered an error.
///
/// Headers keep their original order. Only one sample is retained per
/// fingerprint (the first seen); request data never influences grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
}

impl RequestInfo {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }
}
