//! Domain-level error taxonomy for evalscope.
//!
//! Only the explorer returns these. Aggregation and presentation are total
//! and never fail on data shape.

use evalscope_store::StorageError;

/// Errors surfaced to the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("run not found: {0}")]
    NotFound(String),

    #[error("failed to load run {evaluation_id}: {reason}")]
    LoadFailure {
        evaluation_id: String,
        reason: String,
    },

    #[error("run {evaluation_id} changed since revision {expected}")]
    Conflict {
        evaluation_id: String,
        expected: String,
    },

    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl ExplorerError {
    /// Map a store error for `evaluation_id` into the explorer taxonomy.
    pub fn from_storage(evaluation_id: &str, err: StorageError) -> Self {
        match err {
            StorageError::RunNotFound { evaluation_id } => ExplorerError::NotFound(evaluation_id),
            StorageError::Malformed { reason, .. } => ExplorerError::LoadFailure {
                evaluation_id: evaluation_id.to_string(),
                reason,
            },
            StorageError::RevisionConflict { expected, .. } => ExplorerError::Conflict {
                evaluation_id: evaluation_id.to_string(),
                expected,
            },
            other => ExplorerError::Storage(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ExplorerError::NotFound(_))
    }
}

/// Result type for explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;
