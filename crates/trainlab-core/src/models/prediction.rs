//! Prediction output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature name to value, as supplied by a caller.
pub type FeatureVector = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionValue {
    /// Class label, `0` or `1`.
    Class(u8),
    /// Unbounded regression output.
    Value(f64),
}

impl PredictionValue {
    #[must_use]
    pub fn as_class(self) -> Option<u8> {
        match self {
            Self::Class(label) => Some(label),
            Self::Value(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub result: PredictionValue,
    pub confidence: f64,
    /// Classification only; the two values are independent and not normalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f64>>,
}
