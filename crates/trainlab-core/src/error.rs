//! Error types for Trainlab Core.

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::models::{DatasetError, ModelStatus};
use crate::storage::StorageError;
use thiserror::Error;
use trainlab_training::TrainingError;

/// Flat classification of [`WorkbenchError`] for callers that only need to
/// pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Conflict,
    NotTrained,
    UnsupportedFormat,
    InvalidInput,
    Config,
}

/// Core error type for workbench operations.
#[derive(Error, Debug)]
pub enum WorkbenchError {
    /// Storage-related errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Lifecycle state machine violation
    #[error("Invalid transition: cannot {action} model {model_id} while it is {from}")]
    InvalidTransition { model_id: u64, from: ModelStatus, action: &'static str },

    /// A simulation is already running for the model
    #[error("Conflict: a training simulation is already active for model {model_id}")]
    Conflict { model_id: u64 },

    /// Prediction or evaluation against a model that is not trained
    #[error("Model {model_id} is not trained (status: {status})")]
    NotTrained { model_id: u64, status: ModelStatus },

    /// Ingestion received something it cannot read
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Validation errors for drafts, patches and hyperparameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Hyperparameter or algorithm rejected by the catalog
    #[error("Invalid input: {0}")]
    Catalog(#[from] CatalogError),

    /// Dataset shape violations
    #[error("Invalid input: {0}")]
    Dataset(#[from] DatasetError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Training primitive errors
    #[error("Training error: {0}")]
    Training(#[from] TrainingError),
}

impl WorkbenchError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(StorageError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Storage(StorageError::InvalidData(_))
            | Self::InvalidInput(_)
            | Self::Catalog(_)
            | Self::Dataset(_)
            | Self::Training(_) => ErrorKind::InvalidInput,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotTrained { .. } => ErrorKind::NotTrained,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for workbench operations.
pub type Result<T> = std::result::Result<T, WorkbenchError>;
