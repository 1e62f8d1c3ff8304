//! Error types for the storage layer.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Item not found in storage.
    #[error("{collection} with id {id} not found")]
    NotFound {
        /// Collection that was addressed.
        collection: &'static str,
        /// Identifier that was looked up.
        id: u64,
    },

    /// Invalid data error.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
