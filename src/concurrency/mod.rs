//! Concurrency Management Module
//!
//! Bounded fan-out for outbound registry calls. Work is issued in fixed-size
//! batches and each batch is joined before the next one starts, which caps
//! simultaneous connections and open descriptors at the batch width.

pub mod batch;

pub use batch::BatchExecutor;

/// Concurrency error types
#[derive(Debug, thiserror::Error)]
pub enum ConcurrencyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Concurrency limit exceeded: requested {requested}, limit {limit}")]
    LimitExceeded { requested: usize, limit: usize },
}

/// Result type for concurrency operations
pub type ConcurrencyResult<T> = Result<T, ConcurrencyError>;
