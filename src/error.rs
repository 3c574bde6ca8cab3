//! Error types for encoding and decoding.

use thiserror::Error;

/// Error variants for compression operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The input stream is malformed or truncated.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// A fixed capacity bound was exhausted.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(&'static str),

    /// An I/O error occurred on the underlying stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for compression operations.
pub type Result<T> = std::result::Result<T, Error>;
