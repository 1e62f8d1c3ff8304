//! Model registry.
//!
//! Owns model configurations and training sessions. Status and metrics only
//! change through [`ModelRegistry::mark_training`] and
//! [`ModelRegistry::complete_training`].

use crate::datasets::DatasetStore;
use crate::error::{Result, WorkbenchError};
use crate::models::{
    DatasetId, ModelConfig, ModelDraft, ModelId, ModelPatch, SessionId, TrainingSession,
};
use crate::storage::MemoryRepository;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use trainlab_training::{ModelMetrics, RunOutcome};

#[derive(Debug)]
pub struct ModelRegistry {
    models: MemoryRepository<ModelConfig>,
    sessions: MemoryRepository<TrainingSession>,
    datasets: Arc<DatasetStore>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new(datasets: Arc<DatasetStore>, latency: Duration) -> Self {
        Self {
            models: MemoryRepository::new(latency),
            sessions: MemoryRepository::new(latency),
            datasets,
        }
    }

    #[must_use]
    pub fn datasets(&self) -> &Arc<DatasetStore> {
        &self.datasets
    }

    pub async fn list(&self) -> Vec<ModelConfig> {
        self.models.list().await
    }

    pub async fn get(&self, id: ModelId) -> Result<ModelConfig> {
        Ok(self.models.get(id).await?)
    }

    /// Always yields a `configured` model with resolved hyperparameters.
    pub async fn create(&self, draft: ModelDraft) -> Result<ModelConfig> {
        self.datasets.get(draft.dataset_id).await?;
        let model = self.models.insert(draft.into_model(Utc::now())?).await;
        info!(
            model_id = model.id,
            algorithm = %model.algorithm,
            dataset_id = model.dataset_id,
            "model configured"
        );
        Ok(model)
    }

    pub async fn update(&self, id: ModelId, patch: ModelPatch) -> Result<ModelConfig> {
        if let Some(dataset_id) = patch.dataset_id {
            self.datasets.get(dataset_id).await?;
        }
        let (model, ()) = self
            .models
            .modify(id, |model| patch.apply(model).map_err(WorkbenchError::from))
            .await?;
        Ok(model)
    }

    /// Sessions of the deleted model are kept as history.
    pub async fn delete(&self, id: ModelId) -> Result<ModelConfig> {
        let model = self.models.delete(id).await?;
        info!(model_id = id, "model deleted");
        Ok(model)
    }

    pub async fn mark_training(&self, id: ModelId) -> Result<ModelConfig> {
        let (model, ()) = self.models.modify(id, ModelConfig::begin_training).await?;
        info!(model_id = id, "model training");
        Ok(model)
    }

    pub async fn complete_training(&self, id: ModelId, metrics: ModelMetrics) -> Result<ModelConfig> {
        let (model, ()) = self
            .models
            .modify(id, |model| model.finish_training(metrics, Utc::now()))
            .await?;
        info!(model_id = id, "model trained");
        Ok(model)
    }

    pub async fn list_sessions(&self) -> Vec<TrainingSession> {
        self.sessions.list().await
    }

    pub async fn get_session(&self, id: SessionId) -> Result<TrainingSession> {
        Ok(self.sessions.get(id).await?)
    }

    /// Sessions of one model, oldest first.
    pub async fn sessions_for_model(&self, model_id: ModelId) -> Vec<TrainingSession> {
        self.sessions
            .list()
            .await
            .into_iter()
            .filter(|session| session.model_id == model_id)
            .collect()
    }

    pub async fn delete_session(&self, id: SessionId) -> Result<TrainingSession> {
        Ok(self.sessions.delete(id).await?)
    }

    pub(crate) async fn open_session(
        &self,
        model_id: ModelId,
        dataset_id: DatasetId,
    ) -> TrainingSession {
        let session = self
            .sessions
            .insert(TrainingSession::open(model_id, dataset_id, Utc::now()))
            .await;
        debug!(model_id, session_id = session.id, "session opened");
        session
    }

    pub(crate) async fn record_progress(&self, id: SessionId, progress: f64) -> Result<()> {
        self.sessions
            .modify(id, |session| {
                session.record_progress(progress, Utc::now());
                Ok::<_, WorkbenchError>(())
            })
            .await?;
        Ok(())
    }

    pub(crate) async fn close_session(
        &self,
        id: SessionId,
        outcome: RunOutcome,
        metrics: Option<ModelMetrics>,
    ) -> Result<TrainingSession> {
        let (session, ()) = self
            .sessions
            .modify(id, |session| {
                session.close(outcome, metrics, Utc::now());
                Ok::<_, WorkbenchError>(())
            })
            .await?;
        debug!(model_id = session.model_id, session_id = id, ?outcome, "session closed");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Algorithm, ParamValue};
    use crate::error::ErrorKind;
    use crate::models::{sample_dataset_draft, ModelStatus};
    use trainlab_training::ClassificationMetrics;

    async fn registry_with_dataset() -> (ModelRegistry, DatasetId) {
        let datasets = Arc::new(DatasetStore::new(Duration::ZERO));
        let dataset = datasets.create(sample_dataset_draft()).await.unwrap();
        (ModelRegistry::new(datasets, Duration::ZERO), dataset.id)
    }

    fn metrics() -> ModelMetrics {
        ClassificationMetrics {
            accuracy: 0.9,
            precision: 0.88,
            recall: 0.91,
            f1_score: 0.89,
            loss: None,
        }
        .into()
    }

    #[tokio::test]
    async fn test_create_requires_existing_dataset() {
        let (registry, _) = registry_with_dataset().await;
        let err = registry
            .create(ModelDraft::new("m", Algorithm::Svm, 42))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_validates_hyperparameters() {
        let (registry, dataset_id) = registry_with_dataset().await;
        let draft = ModelDraft::new("m", Algorithm::Svm, dataset_id).with_hyperparameters(
            [("kernel".to_string(), ParamValue::Text("cubic".into()))].into_iter().collect(),
        );
        assert_eq!(registry.create(draft).await.unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_transition_guards() {
        let (registry, dataset_id) = registry_with_dataset().await;
        let model = registry
            .create(ModelDraft::new("m", Algorithm::DecisionTree, dataset_id))
            .await
            .unwrap();

        let err = registry.complete_training(model.id, metrics()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(registry.get(model.id).await.unwrap().status, ModelStatus::Configured);

        registry.mark_training(model.id).await.unwrap();
        let err = registry.mark_training(model.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let trained = registry.complete_training(model.id, metrics()).await.unwrap();
        assert_eq!(trained.status, ModelStatus::Trained);
        assert!(trained.trained_at.is_some());
        assert!(trained.status_invariant_holds());
    }

    #[tokio::test]
    async fn test_update_cannot_touch_status() {
        let (registry, dataset_id) = registry_with_dataset().await;
        let model = registry
            .create(ModelDraft::new("m", Algorithm::RandomForest, dataset_id))
            .await
            .unwrap();
        registry.mark_training(model.id).await.unwrap();
        registry.complete_training(model.id, metrics()).await.unwrap();

        let updated = registry
            .update(model.id, ModelPatch { name: Some("renamed".into()), ..ModelPatch::default() })
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.status, ModelStatus::Trained);
        assert!(updated.metrics.is_some());
    }

    #[tokio::test]
    async fn test_sessions_are_tracked_per_model() {
        let (registry, dataset_id) = registry_with_dataset().await;
        let first = registry.open_session(1, dataset_id).await;
        registry.open_session(2, dataset_id).await;
        registry.record_progress(first.id, 30.0).await.unwrap();
        let closed = registry
            .close_session(first.id, RunOutcome::Stopped, Some(metrics()))
            .await
            .unwrap();

        assert_eq!(closed.progress, 30.0);
        assert!(closed.stopped_at.is_some());
        assert_eq!(registry.sessions_for_model(1).await, vec![closed]);
        assert_eq!(registry.list_sessions().await.len(), 2);
    }
}
