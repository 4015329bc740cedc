//! Error types for the stream module.

use siagate_consensus::ConsensusError;
use thiserror::Error;

/// Errors that can occur while streaming consensus changes.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The consensus set refused or ended the subscription.
    #[error("could not subscribe: {0}")]
    Registry(#[from] ConsensusError),

    /// Writing to or reading from the connection failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A change could not be serialized.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The stream held bytes that are not a change.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The streaming task panicked or was aborted.
    #[error("stream task failed: {0}")]
    Join(String),
}

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;
