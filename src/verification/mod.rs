//! Per-address validation and its batch scheduler.

pub mod pipeline;
pub mod pool;

pub use pipeline::{ValidationPipeline, SMTP_SKIPPED};
pub use pool::{BatchRequest, CancelToken, WorkerPool, CANCELLED};
