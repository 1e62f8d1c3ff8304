use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid simulation settings: {0}")]
    InvalidSettings(String),

    #[error("invalid metrics: {0}")]
    InvalidMetrics(String),

    #[error("unknown problem type: {0}")]
    UnknownProblemType(String),
}
