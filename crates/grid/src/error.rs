//! Error types for grid routing.

use corelib::NodeId;
use thiserror::Error;

/// Failure at the encode/decode boundary.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(Box<dyn std::error::Error + Send + Sync>),

    #[error("decode error: {0}")]
    Decode(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transport to {node} failed: {reason}")]
    Transport { node: NodeId, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no tokio runtime available: {0}")]
    Runtime(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
