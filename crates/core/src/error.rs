//! Storage error model.

use thiserror::Error;

/// Result type used by the storage adapter and the stores built on it.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure while reading or writing a persisted record.
///
/// A missing key is not an error; readers get `Ok(None)`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be read or written (disk, quota, permissions).
    #[error("storage backend failure for key '{key}': {message}")]
    Backend { key: String, message: String },

    /// The value could not be encoded as JSON.
    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored text is not valid JSON for the requested type.
    #[error("failed to deserialize value for key '{key}': {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn backend(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            StorageError::Backend { key, .. }
            | StorageError::Serialize { key, .. }
            | StorageError::Deserialize { key, .. } => key,
        }
    }
}
