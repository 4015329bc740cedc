//! Error types for the query surface.

use serde::Serialize;
use thiserror::Error;

/// Errors returned to API clients.
///
/// Every variant carries the message a client sees. Transport layers pick the
/// status with [`ApiError::status_code`] and the body with [`ApiError::to_json`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request was malformed or named something that does not exist.
    #[error("{0}")]
    BadRequest(String),

    /// The consensus set rejected a submitted transaction set.
    #[error("{0}")]
    ValidationFailed(String),

    /// The consensus set is in a state it should never be in.
    #[error("{0}")]
    Internal(String),
}

/// Wire form of an error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::ValidationFailed(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m) | Self::ValidationFailed(m) | Self::Internal(m) => m,
        }
    }

    /// `{"message": "..."}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(ErrorBody {
            message: self.message()
        })
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
