//! Prediction engine.
//!
//! Stateless apart from its random source: every call reads the model from
//! the registry and returns a simulated inference.

use crate::error::{Result, WorkbenchError};
use crate::models::{FeatureVector, ModelConfig, ModelId, PredictionResult, PredictionValue};
use crate::registry::ModelRegistry;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use trainlab_training::{ProblemType, RandomFactory, RandomSource};

const CONFIDENCE_FLOOR: f64 = 0.7;
const CONFIDENCE_SPAN: f64 = 0.3;
const SCALE_RANGE: (f64, f64) = (0.9, 1.1);
const OFFSET_RANGE: (f64, f64) = (-0.5, 0.5);

pub struct PredictionEngine {
    registry: Arc<ModelRegistry>,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl PredictionEngine {
    pub fn new(registry: Arc<ModelRegistry>, random: &dyn RandomFactory) -> Self {
        Self { registry, rng: Mutex::new(random.create()) }
    }

    /// Simulated inference for a trained model.
    ///
    /// Feature names are not checked against the model's dataset.
    pub async fn predict(&self, model_id: ModelId, features: &FeatureVector) -> Result<PredictionResult> {
        let model = self.trained_model(model_id).await?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let prediction = match model.problem_type {
            ProblemType::Classification => classify(rng.as_mut()),
            ProblemType::Regression => regress(rng.as_mut(), features),
        };
        drop(rng);
        debug!(model_id, result = ?prediction.result, confidence = prediction.confidence, "prediction made");
        Ok(prediction)
    }

    /// Feature columns of the model's dataset, pre-filled from its first row.
    pub async fn feature_template(&self, model_id: ModelId) -> Result<FeatureVector> {
        let model = self.registry.get(model_id).await?;
        let dataset = self.registry.datasets().get(model.dataset_id).await?;
        Ok(dataset.sample_features())
    }

    async fn trained_model(&self, model_id: ModelId) -> Result<ModelConfig> {
        let model = self.registry.get(model_id).await?;
        if model.is_trained() {
            Ok(model)
        } else {
            Err(WorkbenchError::NotTrained { model_id, status: model.status })
        }
    }
}

fn confidence(rng: &mut dyn RandomSource) -> f64 {
    CONFIDENCE_FLOOR + CONFIDENCE_SPAN * rng.next_unit()
}

/// Draw order: label, confidence, `class_0`, `class_1`.
fn classify(rng: &mut dyn RandomSource) -> PredictionResult {
    let label = u8::from(rng.next_unit() >= 0.5);
    let confidence = confidence(rng);
    let probabilities = BTreeMap::from([
        ("class_0".to_string(), rng.next_unit()),
        ("class_1".to_string(), rng.next_unit()),
    ]);
    PredictionResult {
        result: PredictionValue::Class(label),
        confidence,
        probabilities: Some(probabilities),
    }
}

/// Draw order: scale, offset, confidence.
fn regress(rng: &mut dyn RandomSource, features: &FeatureVector) -> PredictionResult {
    let mean = if features.is_empty() {
        0.0
    } else {
        features.values().sum::<f64>() / features.len() as f64
    };
    let scale = rng.uniform(SCALE_RANGE.0, SCALE_RANGE.1);
    let offset = rng.uniform(OFFSET_RANGE.0, OFFSET_RANGE.1);
    PredictionResult {
        result: PredictionValue::Value(mean * scale + offset),
        confidence: confidence(rng),
        probabilities: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainlab_training::ScriptedRandom;

    #[test]
    fn test_classify_uses_draws_in_order() {
        let mut rng = ScriptedRandom::new(vec![0.75, 0.5, 0.2, 0.9]);
        let prediction = classify(&mut rng);
        assert_eq!(prediction.result, PredictionValue::Class(1));
        assert!((prediction.confidence - 0.85).abs() < 1e-12);
        let probabilities = prediction.probabilities.unwrap();
        assert_eq!(probabilities["class_0"], 0.2);
        assert_eq!(probabilities["class_1"], 0.9);
    }

    #[test]
    fn test_regress_scales_feature_mean() {
        // scale 1.0, offset 0.0, confidence 0.85
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let features = FeatureVector::from([("a".to_string(), 2.0), ("b".to_string(), 4.0)]);
        let prediction = regress(&mut rng, &features);
        match prediction.result {
            PredictionValue::Value(v) => assert!((v - 3.0).abs() < 1e-9),
            PredictionValue::Class(_) => panic!("regression produced a class"),
        }
        assert!(prediction.probabilities.is_none());
    }

    #[test]
    fn test_regress_empty_features_is_offset_only() {
        let mut rng = ScriptedRandom::new(vec![0.0]);
        let prediction = regress(&mut rng, &FeatureVector::new());
        assert_eq!(prediction.result, PredictionValue::Value(-0.5));
        assert_eq!(prediction.confidence, 0.7);
    }
}
