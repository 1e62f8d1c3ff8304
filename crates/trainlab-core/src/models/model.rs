//! Model configurations and their lifecycle status.
//!
//! A model starts `configured`, moves to `training` when a simulation picks
//! it up, and ends `trained` once final metrics are written. The transition
//! methods on [`ModelConfig`] are the only code that touches `status` and
//! `metrics`, which keeps "metrics present iff trained" true.

use crate::catalog::{self, Algorithm, CatalogError, Hyperparameters};
use crate::error::{Result, WorkbenchError};
use crate::models::dataset::DatasetId;
use crate::storage::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use trainlab_training::{ModelMetrics, ProblemType};

pub type ModelId = u64;

/// Lifecycle status of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Created or edited, never trained.
    #[default]
    Configured,
    /// A simulation has claimed the model.
    Training,
    /// Final metrics are available.
    Trained,
}

impl ModelStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configured => "configured",
            Self::Training => "training",
            Self::Trained => "trained",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub id: ModelId,
    pub name: String,
    pub problem_type: ProblemType,
    pub algorithm: Algorithm,
    pub hyperparameters: Hyperparameters,
    pub dataset_id: DatasetId,
    pub status: ModelStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ModelMetrics>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
}

impl ModelConfig {
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.status == ModelStatus::Trained
    }

    /// `configured -> training`.
    pub fn begin_training(&mut self) -> Result<()> {
        if self.status != ModelStatus::Configured {
            return Err(WorkbenchError::InvalidTransition {
                model_id: self.id,
                from: self.status,
                action: "start training of",
            });
        }
        self.status = ModelStatus::Training;
        Ok(())
    }

    /// `training -> trained`, or `trained -> trained` on re-training.
    ///
    /// Metrics must belong to the model's problem type and lie in range.
    pub fn finish_training(&mut self, metrics: ModelMetrics, at: DateTime<Utc>) -> Result<()> {
        if self.status == ModelStatus::Configured {
            return Err(WorkbenchError::InvalidTransition {
                model_id: self.id,
                from: self.status,
                action: "complete training of",
            });
        }
        if metrics.problem_type() != self.problem_type {
            return Err(WorkbenchError::InvalidInput(format!(
                "{} metrics supplied for {} model {}",
                metrics.problem_type(),
                self.problem_type,
                self.id
            )));
        }
        metrics.validate()?;

        self.status = ModelStatus::Trained;
        self.metrics = Some(metrics);
        self.trained_at = Some(at);
        Ok(())
    }

    /// Holds whenever the model was only changed through the transition methods.
    #[must_use]
    pub fn status_invariant_holds(&self) -> bool {
        self.metrics.is_some() == self.is_trained()
    }
}

impl Entity for ModelConfig {
    const COLLECTION: &'static str = "models";

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Fields supplied when a model is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDraft {
    pub name: String,
    pub problem_type: ProblemType,
    pub algorithm: Algorithm,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
    pub dataset_id: DatasetId,
}

impl ModelDraft {
    /// Draft with every hyperparameter at its default.
    #[must_use]
    pub fn new(name: impl Into<String>, algorithm: Algorithm, dataset_id: DatasetId) -> Self {
        Self {
            name: name.into(),
            problem_type: algorithm.problem_type(),
            algorithm,
            hyperparameters: Hyperparameters::new(),
            dataset_id,
        }
    }

    #[must_use]
    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    /// Validate against the catalog and build a fresh `configured` model.
    pub fn into_model(self, created_at: DateTime<Utc>) -> std::result::Result<ModelConfig, CatalogError> {
        catalog::ensure_problem_type(self.algorithm, self.problem_type)?;
        let hyperparameters = catalog::resolve_hyperparameters(self.algorithm, &self.hyperparameters)?;
        Ok(ModelConfig {
            id: 0,
            name: self.name,
            problem_type: self.problem_type,
            algorithm: self.algorithm,
            hyperparameters,
            dataset_id: self.dataset_id,
            status: ModelStatus::Configured,
            metrics: None,
            created_at,
            trained_at: None,
        })
    }
}

/// Editable subset of a model. Status and metrics are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    #[serde(default)]
    pub hyperparameters: Option<Hyperparameters>,
    #[serde(default)]
    pub dataset_id: Option<DatasetId>,
}

impl ModelPatch {
    /// Shallow merge onto `model`.
    ///
    /// Switching algorithm without new hyperparameters resets them to the new
    /// algorithm's defaults; supplied hyperparameters replace the old set.
    pub fn apply(self, model: &mut ModelConfig) -> std::result::Result<(), CatalogError> {
        if let Some(name) = self.name {
            model.name = name;
        }
        if let Some(dataset_id) = self.dataset_id {
            model.dataset_id = dataset_id;
        }

        let algorithm_changed = self.algorithm.is_some_and(|a| a != model.algorithm);
        if let Some(algorithm) = self.algorithm {
            catalog::ensure_problem_type(algorithm, model.problem_type)?;
            model.algorithm = algorithm;
        }
        match self.hyperparameters {
            Some(supplied) => {
                model.hyperparameters = catalog::resolve_hyperparameters(model.algorithm, &supplied)?;
            }
            None if algorithm_changed => {
                model.hyperparameters = model.algorithm.default_hyperparameters();
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ParamValue;
    use trainlab_training::{ClassificationMetrics, RegressionMetrics};

    fn configured() -> ModelConfig {
        ModelDraft::new("forest", Algorithm::RandomForest, 1).into_model(Utc::now()).unwrap()
    }

    fn classification_metrics() -> ModelMetrics {
        ClassificationMetrics {
            accuracy: 0.9,
            precision: 0.85,
            recall: 0.9,
            f1_score: 0.88,
            loss: Some(0.2),
        }
        .into()
    }

    #[test]
    fn test_new_model_is_configured_without_metrics() {
        let model = configured();
        assert_eq!(model.status, ModelStatus::Configured);
        assert!(model.metrics.is_none());
        assert!(model.status_invariant_holds());
        assert_eq!(model.hyperparameters.len(), 3);
    }

    #[test]
    fn test_cannot_complete_from_configured() {
        let mut model = configured();
        let err = model.finish_training(classification_metrics(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            WorkbenchError::InvalidTransition { from: ModelStatus::Configured, .. }
        ));
        assert!(model.metrics.is_none());
    }

    #[test]
    fn test_lifecycle_and_retraining() {
        let mut model = configured();
        model.begin_training().unwrap();
        assert!(model.begin_training().is_err());

        model.finish_training(classification_metrics(), Utc::now()).unwrap();
        assert!(model.is_trained());
        assert!(model.status_invariant_holds());

        // trained -> trained overwrites metrics
        model.finish_training(classification_metrics(), Utc::now()).unwrap();
        assert!(model.is_trained());
    }

    #[test]
    fn test_finish_rejects_wrong_problem_type() {
        let mut model = configured();
        model.begin_training().unwrap();
        let metrics: ModelMetrics =
            RegressionMetrics { r2: 0.9, mae: 0.1, mse: 0.02, rmse: 0.02_f64.sqrt() }.into();
        assert!(matches!(
            model.finish_training(metrics, Utc::now()),
            Err(WorkbenchError::InvalidInput(_))
        ));
        assert_eq!(model.status, ModelStatus::Training);
    }

    #[test]
    fn test_patch_resets_hyperparameters_on_algorithm_change() {
        let mut model = configured();
        ModelPatch { algorithm: Some(Algorithm::Svm), ..ModelPatch::default() }
            .apply(&mut model)
            .unwrap();
        assert_eq!(model.algorithm, Algorithm::Svm);
        assert_eq!(model.hyperparameters["kernel"], ParamValue::Text("rbf".into()));
        assert!(!model.hyperparameters.contains_key("n_estimators"));
    }

    #[test]
    fn test_patch_rejects_cross_problem_algorithm() {
        let mut model = configured();
        let err = ModelPatch { algorithm: Some(Algorithm::Svr), ..ModelPatch::default() }
            .apply(&mut model)
            .unwrap_err();
        assert!(matches!(err, CatalogError::ProblemTypeMismatch { .. }));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(configured()).unwrap();
        assert_eq!(json["problemType"], "classification");
        assert_eq!(json["algorithm"], "random_forest");
        assert_eq!(json["datasetId"], 1);
        assert_eq!(json["status"], "configured");
        assert!(json.get("metrics").is_none());
    }
}
