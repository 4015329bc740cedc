//! Error types for Siagate Core.

use thiserror::Error;

/// Core errors that can occur while parsing, encoding or doing ledger arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("input has wrong length to be an encoded {kind}: expected {expected} hex chars, got {got}")]
    InvalidIdentifier {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("unlock hash checksum mismatch")]
    InvalidChecksum,

    #[error("currency overflow")]
    Overflow,

    #[error("currency underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::InvalidHex(e.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
