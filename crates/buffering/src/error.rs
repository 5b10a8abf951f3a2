//! Error types for the buffering primitives.

/// Result type alias for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The entry can never be observed (a dead weak reference)
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Dequeue found no live entry
    #[error("queue is empty")]
    Empty,
}
