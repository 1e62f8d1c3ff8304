//! Evaluation reports for trained models.

use crate::error::{Result, WorkbenchError};
use crate::models::ModelId;
use crate::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use trainlab_training::{ModelMetrics, ProblemType, RandomFactory, RandomSource};

const CONFUSION_LABELS: [&str; 3] = ["Class A", "Class B", "Class C"];
const CONFUSION_COUNTS: [[u32; 3]; 3] = [[45, 3, 2], [2, 38, 5], [1, 4, 42]];
const ROC_STEPS: u32 = 20;
const ROC_NOISE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    /// `matrix[actual][predicted]`
    pub matrix: Vec<Vec<u32>>,
}

impl ConfusionMatrix {
    #[must_use]
    pub fn total(&self) -> u32 {
        self.matrix.iter().flatten().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
    pub auc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub model_id: ModelId,
    pub metrics: ModelMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confusion_matrix: Option<ConfusionMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roc_curve: Option<RocCurve>,
}

pub struct ModelEvaluator {
    registry: Arc<ModelRegistry>,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl ModelEvaluator {
    pub fn new(registry: Arc<ModelRegistry>, random: &dyn RandomFactory) -> Self {
        Self { registry, rng: Mutex::new(random.create()) }
    }

    /// Stored metrics plus, for classifiers, a confusion matrix and ROC curve.
    pub async fn evaluate(&self, model_id: ModelId) -> Result<EvaluationReport> {
        let model = self.registry.get(model_id).await?;
        let Some(metrics) = model.metrics.clone().filter(|_| model.is_trained()) else {
            return Err(WorkbenchError::NotTrained { model_id, status: model.status });
        };

        let (confusion_matrix, roc_curve) = match model.problem_type {
            ProblemType::Classification => {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                (Some(confusion_matrix()), Some(roc_curve(rng.as_mut())))
            }
            ProblemType::Regression => (None, None),
        };
        Ok(EvaluationReport { model_id, metrics, confusion_matrix, roc_curve })
    }
}

fn confusion_matrix() -> ConfusionMatrix {
    ConfusionMatrix {
        labels: CONFUSION_LABELS.iter().map(ToString::to_string).collect(),
        matrix: CONFUSION_COUNTS.iter().map(|row| row.to_vec()).collect(),
    }
}

/// `ROC_STEPS + 1` points on `fpr = i / ROC_STEPS`; AUC by the trapezoid rule.
fn roc_curve(rng: &mut dyn RandomSource) -> RocCurve {
    let points: Vec<RocPoint> = (0..=ROC_STEPS)
        .map(|i| {
            let x = f64::from(i) / f64::from(ROC_STEPS);
            let tpr = (x * 1.8 - x * x * 0.5 + rng.uniform(0.0, ROC_NOISE)).min(1.0);
            RocPoint { fpr: x, tpr }
        })
        .collect();
    let auc = points
        .windows(2)
        .map(|pair| (pair[1].fpr - pair[0].fpr) * (pair[0].tpr + pair[1].tpr) / 2.0)
        .sum();
    RocCurve { points, auc }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainlab_training::ScriptedRandom;

    #[test]
    fn test_confusion_matrix_is_fixed() {
        let matrix = confusion_matrix();
        assert_eq!(matrix.labels, vec!["Class A", "Class B", "Class C"]);
        assert_eq!(matrix.matrix[1], vec![2, 38, 5]);
        assert_eq!(matrix.total(), 142);
    }

    #[test]
    fn test_roc_curve_shape() {
        let mut rng = ScriptedRandom::constant(0.0);
        let roc = roc_curve(&mut rng);
        assert_eq!(roc.points.len(), 21);
        assert_eq!(roc.points[0], RocPoint { fpr: 0.0, tpr: 0.0 });
        assert_eq!(roc.points[20].tpr, 1.0);
        assert!(roc.points.iter().all(|p| (0.0..=1.0).contains(&p.tpr)));
        assert!(roc.auc > 0.5 && roc.auc <= 1.0);
    }
}
