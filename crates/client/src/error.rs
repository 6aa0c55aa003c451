//! Client error taxonomy.

use thiserror::Error;

use labeldesk_core::StorageError;

/// Failure below the HTTP layer: no response was received.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Superseded by a newer request with the same signature.
    /// Callers should ignore it.
    #[error("request cancelled")]
    Cancelled,

    /// HTTP 401; the session has already been cleared.
    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// 2xx with a failure marker in the envelope.
    #[error("{message}")]
    Business { code: Option<i64>, message: String },

    /// Network failure or timeout on every attempt.
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("invalid response envelope: {0}")]
    InvalidEnvelope(String),

    #[error("failed to decode response payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Server { status, .. } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
