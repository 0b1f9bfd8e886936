//! Error types for evalscope-store

use thiserror::Error;

/// Errors raised by [`RunStore`](crate::RunStore) implementations.
///
/// Only I/O-level problems and identifier misses are errors here; missing
/// optional fields inside a document are never reported by the store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No stored document carries the requested evaluation id
    #[error("run not found: {evaluation_id}")]
    RunNotFound { evaluation_id: String },

    /// Document could not be parsed as a JSON object
    #[error("malformed run document at {location}: {reason}")]
    Malformed { location: String, reason: String },

    /// Underlying filesystem failure
    #[error("io error at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure while writing a document
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored document changed since it was read
    #[error("revision conflict for {evaluation_id}: expected {expected}, found {actual}")]
    RevisionConflict {
        evaluation_id: String,
        expected: String,
        actual: String,
    },
}

impl StorageError {
    pub(crate) fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Io {
            location: location.into(),
            source,
        }
    }

    /// True for the identifier-miss outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::RunNotFound { .. })
    }
}
