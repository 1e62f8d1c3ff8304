use crate::error::{TrainingError, TrainingResult};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    Classification,
    Regression,
}

impl ProblemType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Regression => "regression",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemType {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classification" => Ok(Self::Classification),
            "regression" => Ok(Self::Regression),
            other => Err(TrainingError::UnknownProblemType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
}

/// Metrics attached to a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelMetrics {
    Classification(ClassificationMetrics),
    Regression(RegressionMetrics),
}

impl ModelMetrics {
    #[must_use]
    pub fn problem_type(&self) -> ProblemType {
        match self {
            Self::Classification(_) => ProblemType::Classification,
            Self::Regression(_) => ProblemType::Regression,
        }
    }

    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            Self::Classification(m) => Some(m.accuracy),
            Self::Regression(_) => None,
        }
    }

    /// Rejects non-finite values and ratios outside `[0, 1]`.
    pub fn validate(&self) -> TrainingResult<()> {
        match self {
            Self::Classification(m) => {
                for (name, value) in [
                    ("accuracy", m.accuracy),
                    ("precision", m.precision),
                    ("recall", m.recall),
                    ("f1Score", m.f1_score),
                ] {
                    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                        return Err(TrainingError::InvalidMetrics(format!(
                            "{name} must lie in [0, 1], got {value}"
                        )));
                    }
                }
                if let Some(loss) = m.loss {
                    check_non_negative("loss", loss)?;
                }
            }
            Self::Regression(m) => {
                check_non_negative("mae", m.mae)?;
                check_non_negative("mse", m.mse)?;
                check_non_negative("rmse", m.rmse)?;
                if !m.r2.is_finite() {
                    return Err(TrainingError::InvalidMetrics("r2 must be finite".to_string()));
                }
            }
        }
        Ok(())
    }
}

fn check_non_negative(name: &str, value: f64) -> TrainingResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TrainingError::InvalidMetrics(format!(
            "{name} must be a finite non-negative number, got {value}"
        )))
    }
}

impl From<ClassificationMetrics> for ModelMetrics {
    fn from(m: ClassificationMetrics) -> Self {
        Self::Classification(m)
    }
}

impl From<RegressionMetrics> for ModelMetrics {
    fn from(m: RegressionMetrics) -> Self {
        Self::Regression(m)
    }
}

/// Half-open ranges the final metric bundle is drawn from.
pub mod ranges {
    pub const ACCURACY: (f64, f64) = (0.85, 0.95);
    pub const PRECISION: (f64, f64) = (0.82, 0.92);
    pub const RECALL: (f64, f64) = (0.88, 0.98);
    pub const F1_SCORE: (f64, f64) = (0.84, 0.94);
    pub const LOSS: (f64, f64) = (0.15, 0.25);

    pub const R2: (f64, f64) = (0.80, 0.95);
    pub const MAE: (f64, f64) = (0.05, 0.15);
    pub const MSE: (f64, f64) = (0.01, 0.05);
}

/// Draw the metric bundle reported when a simulated run is finalized.
///
/// Each value is drawn independently; `rmse` is derived from `mse`.
pub fn draw_final_metrics(problem: ProblemType, rng: &mut dyn RandomSource) -> ModelMetrics {
    let mut draw = |(low, high): (f64, f64)| rng.uniform(low, high);
    match problem {
        ProblemType::Classification => ModelMetrics::Classification(ClassificationMetrics {
            accuracy: draw(ranges::ACCURACY),
            precision: draw(ranges::PRECISION),
            recall: draw(ranges::RECALL),
            f1_score: draw(ranges::F1_SCORE),
            loss: Some(draw(ranges::LOSS)),
        }),
        ProblemType::Regression => {
            let r2 = draw(ranges::R2);
            let mae = draw(ranges::MAE);
            let mse = draw(ranges::MSE);
            ModelMetrics::Regression(RegressionMetrics { r2, mae, mse, rmse: mse.sqrt() })
        }
    }
}
