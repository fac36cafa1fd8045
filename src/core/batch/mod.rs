//! Multi-message processing
//!
//! Splits an input holding many messages, converts them concurrently and
//! reports every outcome in input order. One failing message never stops its
//! siblings.

pub mod processor;
pub mod split;
pub mod summary;

pub use processor::{BatchConfig, BatchProcessor, BatchResult, MessageOutcome};
pub use split::split_messages;
pub use summary::BatchSummary;
