//! Data models for Trainlab Core.
//!
//! Datasets, model configurations, training sessions and prediction output.

pub mod dataset;
pub mod model;
pub mod prediction;
pub mod session;

pub use dataset::{
    record, sample_dataset_draft, Dataset, DatasetDraft, DatasetError, DatasetId, DatasetPatch,
    Record, Scalar, Shape,
};
pub use model::{ModelConfig, ModelDraft, ModelId, ModelPatch, ModelStatus};
pub use prediction::{FeatureVector, PredictionResult, PredictionValue};
pub use session::{SessionId, SessionStatus, TrainingSession};
