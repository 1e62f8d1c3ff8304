//! Trainlab Core - experiment lifecycle manager.
//!
//! This crate provides:
//! - In-memory dataset and model stores with simulated latency
//! - The model lifecycle (`configured -> training -> trained`)
//! - Cancellable training simulations with progress streams
//! - Simulated prediction and evaluation
//! - CSV ingestion and TOML/env configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use trainlab_core::{Workbench, WorkbenchConfig};
//!
//! #[tokio::main]
//! async fn main() -> trainlab_core::Result<()> {
//!     let workbench = Workbench::new(WorkbenchConfig::load(None)?)?;
//!     workbench.init().await?;
//!     println!("{} datasets", workbench.datasets().len().await);
//!     workbench.teardown().await;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod datasets;
pub mod error;
pub mod evaluation;
pub mod ingest;
pub mod models;
pub mod prediction;
pub mod registry;
pub mod storage;
pub mod training;
pub mod workbench;

pub use catalog::{
    resolve_hyperparameters, Algorithm, CatalogError, Hyperparameters, ParamKind, ParamLiteral,
    ParamSpec, ParamValue,
};
pub use config::{ConfigError, SimulationConfig, StoreConfig, WorkbenchConfig};
pub use datasets::DatasetStore;
pub use error::{ErrorKind, Result, WorkbenchError};
pub use evaluation::{ConfusionMatrix, EvaluationReport, ModelEvaluator, RocCurve, RocPoint};
pub use ingest::{CsvIngestor, Ingestor};
pub use models::{
    record, sample_dataset_draft, Dataset, DatasetDraft, DatasetId, DatasetPatch, FeatureVector,
    ModelConfig, ModelDraft, ModelId, ModelPatch, ModelStatus, PredictionResult, PredictionValue,
    Record, Scalar, SessionId, SessionStatus, Shape, TrainingSession,
};
pub use prediction::PredictionEngine;
pub use registry::ModelRegistry;
pub use storage::StorageError;
pub use training::TrainingSimulator;
pub use workbench::{Workbench, WorkbenchBuilder};

pub use trainlab_training::{
    ClassificationMetrics, CurveSnapshot, ModelMetrics, ProblemType, ProgressEvent,
    RegressionMetrics, RunOutcome, SimulationSettings,
};
