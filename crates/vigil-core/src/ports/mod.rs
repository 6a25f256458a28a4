//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod sink;
mod store;

pub use sink::{AlertSink, SinkError};
pub use store::{AlertStorage, StorageError};
