//! Training sessions: one record per simulation run.

use crate::models::dataset::DatasetId;
use crate::models::model::ModelId;
use crate::storage::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trainlab_training::{ModelMetrics, RunOutcome, MAX_PROGRESS};

pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Running,
    Completed,
    Stopped,
}

impl From<RunOutcome> for SessionStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => Self::Completed,
            RunOutcome::Stopped => Self::Stopped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSession {
    pub id: SessionId,
    pub model_id: ModelId,
    pub dataset_id: DatasetId,
    pub status: SessionStatus,
    pub progress: f64,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ModelMetrics>,
}

impl TrainingSession {
    #[must_use]
    pub fn open(model_id: ModelId, dataset_id: DatasetId, at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            model_id,
            dataset_id,
            status: SessionStatus::Running,
            progress: 0.0,
            started_at: at,
            last_updated: at,
            completed_at: None,
            stopped_at: None,
            metrics: None,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Progress only moves forward and never past 100.
    pub fn record_progress(&mut self, progress: f64, at: DateTime<Utc>) {
        self.progress = self.progress.max(progress.clamp(0.0, MAX_PROGRESS));
        self.last_updated = at;
    }

    pub fn close(&mut self, outcome: RunOutcome, metrics: Option<ModelMetrics>, at: DateTime<Utc>) {
        self.status = outcome.into();
        match outcome {
            RunOutcome::Completed => self.completed_at = Some(at),
            RunOutcome::Stopped => self.stopped_at = Some(at),
        }
        self.metrics = metrics;
        self.last_updated = at;
    }
}

impl Entity for TrainingSession {
    const COLLECTION: &'static str = "sessions";

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_never_decreases() {
        let mut session = TrainingSession::open(1, 1, Utc::now());
        session.record_progress(40.0, Utc::now());
        session.record_progress(12.0, Utc::now());
        assert_eq!(session.progress, 40.0);
        session.record_progress(250.0, Utc::now());
        assert_eq!(session.progress, 100.0);
    }

    #[test]
    fn test_close_sets_matching_timestamp() {
        let mut session = TrainingSession::open(1, 1, Utc::now());
        session.close(RunOutcome::Stopped, None, Utc::now());
        assert_eq!(session.status, SessionStatus::Stopped);
        assert!(session.stopped_at.is_some());
        assert!(session.completed_at.is_none());
        assert!(!session.is_running());
    }
}
