//! Domain types flowing through the aggregation and dispatch pipeline.

mod entry;
mod report;

pub use entry::{Batch, ErrorEntry};
pub use report::{ExceptionInfo, RequestInfo};
