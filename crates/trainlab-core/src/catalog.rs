//! Algorithm catalog and hyperparameter schemas.
//!
//! Each algorithm belongs to one problem type and declares the parameters it
//! accepts. [`resolve_hyperparameters`] validates user input against that
//! schema and fills in defaults for anything left unspecified.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use trainlab_training::ProblemType;

/// A hyperparameter value as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl ParamValue {
    /// Parse a `key=value` style literal: booleans, then numbers, then text.
    #[must_use]
    pub fn parse_literal(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(b) = raw.parse::<bool>() {
            Self::Bool(b)
        } else if let Ok(n) = raw.parse::<f64>() {
            Self::Number(n)
        } else {
            Self::Text(raw.to_string())
        }
    }
}

pub type Hyperparameters = BTreeMap<String, ParamValue>;

/// Compile-time literal used for defaults and choice options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamLiteral {
    Bool(bool),
    Number(f64),
    Text(&'static str),
}

impl ParamLiteral {
    #[must_use]
    pub fn to_value(self) -> ParamValue {
        match self {
            Self::Bool(b) => ParamValue::Bool(b),
            Self::Number(n) => ParamValue::Number(n),
            Self::Text(s) => ParamValue::Text(s.to_string()),
        }
    }

    /// Choice options match either the typed value or its text form, since
    /// form inputs usually hand back strings.
    fn matches(self, value: &ParamValue) -> bool {
        match (self, value) {
            (Self::Bool(a), ParamValue::Bool(b)) => a == *b,
            (Self::Number(a), ParamValue::Number(b)) => (a - b).abs() < f64::EPSILON,
            (Self::Text(a), ParamValue::Text(b)) => a == b,
            (literal, ParamValue::Text(text)) => literal.to_value().to_string() == *text,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Range { min: f64, max: f64, step: f64 },
    Choice(&'static [ParamLiteral]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
    pub default: ParamLiteral,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("algorithm {algorithm} does not accept parameter {key}")]
    UnknownParameter { algorithm: &'static str, key: String },
    #[error("parameter {key} must be a number in [{min}, {max}], got {value}")]
    OutOfRange { key: &'static str, min: f64, max: f64, value: ParamValue },
    #[error("parameter {key} must be {min} plus a multiple of {step}, got {value}")]
    OffStep { key: &'static str, min: f64, step: f64, value: ParamValue },
    #[error("parameter {key} must be one of {options}, got {value}")]
    NotAnOption { key: &'static str, options: String, value: ParamValue },
    #[error("algorithm {algorithm} solves {expected} problems, not {requested}")]
    ProblemTypeMismatch {
        algorithm: &'static str,
        expected: ProblemType,
        requested: ProblemType,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    LogisticRegression,
    DecisionTree,
    RandomForest,
    Svm,
    LinearRegression,
    DecisionTreeReg,
    RandomForestReg,
    Svr,
}

const C_RANGE: ParamKind = ParamKind::Range { min: 0.01, max: 10.0, step: 0.01 };
const DEPTH_RANGE: ParamKind = ParamKind::Range { min: 1.0, max: 20.0, step: 1.0 };
const SPLIT_RANGE: ParamKind = ParamKind::Range { min: 2.0, max: 20.0, step: 1.0 };
const TREES_RANGE: ParamKind = ParamKind::Range { min: 10.0, max: 500.0, step: 10.0 };

const REGULARIZATION: ParamSpec = ParamSpec {
    key: "C",
    label: "Regularization Strength (C)",
    kind: C_RANGE,
    default: ParamLiteral::Number(1.0),
};
const MAX_DEPTH: ParamSpec = ParamSpec {
    key: "max_depth",
    label: "Maximum Depth",
    kind: DEPTH_RANGE,
    default: ParamLiteral::Number(5.0),
};
const MIN_SAMPLES_SPLIT: ParamSpec = ParamSpec {
    key: "min_samples_split",
    label: "Min Samples Split",
    kind: SPLIT_RANGE,
    default: ParamLiteral::Number(2.0),
};
const N_ESTIMATORS: ParamSpec = ParamSpec {
    key: "n_estimators",
    label: "Number of Trees",
    kind: TREES_RANGE,
    default: ParamLiteral::Number(100.0),
};

const LOGISTIC_REGRESSION_PARAMS: &[ParamSpec] = &[
    REGULARIZATION,
    ParamSpec {
        key: "max_iter",
        label: "Maximum Iterations",
        kind: ParamKind::Range { min: 100.0, max: 2000.0, step: 100.0 },
        default: ParamLiteral::Number(1000.0),
    },
];
const DECISION_TREE_PARAMS: &[ParamSpec] = &[
    MAX_DEPTH,
    MIN_SAMPLES_SPLIT,
    ParamSpec {
        key: "min_samples_leaf",
        label: "Min Samples Leaf",
        kind: DEPTH_RANGE,
        default: ParamLiteral::Number(1.0),
    },
];
const RANDOM_FOREST_PARAMS: &[ParamSpec] = &[N_ESTIMATORS, MAX_DEPTH, MIN_SAMPLES_SPLIT];
const SVM_PARAMS: &[ParamSpec] = &[
    REGULARIZATION,
    ParamSpec {
        key: "kernel",
        label: "Kernel Type",
        kind: ParamKind::Choice(&[
            ParamLiteral::Text("linear"),
            ParamLiteral::Text("rbf"),
            ParamLiteral::Text("poly"),
            ParamLiteral::Text("sigmoid"),
        ]),
        default: ParamLiteral::Text("rbf"),
    },
];
const LINEAR_REGRESSION_PARAMS: &[ParamSpec] = &[ParamSpec {
    key: "fit_intercept",
    label: "Fit Intercept",
    kind: ParamKind::Choice(&[ParamLiteral::Bool(true), ParamLiteral::Bool(false)]),
    default: ParamLiteral::Bool(true),
}];
const DECISION_TREE_REG_PARAMS: &[ParamSpec] = &[MAX_DEPTH, MIN_SAMPLES_SPLIT];
const RANDOM_FOREST_REG_PARAMS: &[ParamSpec] = &[N_ESTIMATORS, MAX_DEPTH];
const SVR_PARAMS: &[ParamSpec] = &[
    REGULARIZATION,
    ParamSpec {
        key: "epsilon",
        label: "Epsilon",
        kind: ParamKind::Range { min: 0.01, max: 1.0, step: 0.01 },
        default: ParamLiteral::Number(0.1),
    },
];

impl Algorithm {
    pub const ALL: [Algorithm; 8] = [
        Self::LogisticRegression,
        Self::DecisionTree,
        Self::RandomForest,
        Self::Svm,
        Self::LinearRegression,
        Self::DecisionTreeReg,
        Self::RandomForestReg,
        Self::Svr,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::LogisticRegression => "logistic_regression",
            Self::DecisionTree => "decision_tree",
            Self::RandomForest => "random_forest",
            Self::Svm => "svm",
            Self::LinearRegression => "linear_regression",
            Self::DecisionTreeReg => "decision_tree_reg",
            Self::RandomForestReg => "random_forest_reg",
            Self::Svr => "svr",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::LogisticRegression => "Logistic Regression",
            Self::DecisionTree => "Decision Tree",
            Self::RandomForest => "Random Forest",
            Self::Svm => "Support Vector Machine",
            Self::LinearRegression => "Linear Regression",
            Self::DecisionTreeReg => "Decision Tree Regressor",
            Self::RandomForestReg => "Random Forest Regressor",
            Self::Svr => "Support Vector Regression",
        }
    }

    #[must_use]
    pub fn problem_type(self) -> ProblemType {
        match self {
            Self::LogisticRegression | Self::DecisionTree | Self::RandomForest | Self::Svm => {
                ProblemType::Classification
            }
            Self::LinearRegression | Self::DecisionTreeReg | Self::RandomForestReg | Self::Svr => {
                ProblemType::Regression
            }
        }
    }

    #[must_use]
    pub fn params(self) -> &'static [ParamSpec] {
        match self {
            Self::LogisticRegression => LOGISTIC_REGRESSION_PARAMS,
            Self::DecisionTree => DECISION_TREE_PARAMS,
            Self::RandomForest => RANDOM_FOREST_PARAMS,
            Self::Svm => SVM_PARAMS,
            Self::LinearRegression => LINEAR_REGRESSION_PARAMS,
            Self::DecisionTreeReg => DECISION_TREE_REG_PARAMS,
            Self::RandomForestReg => RANDOM_FOREST_REG_PARAMS,
            Self::Svr => SVR_PARAMS,
        }
    }

    /// Algorithms offered for one problem type, in catalog order.
    pub fn for_problem(problem: ProblemType) -> impl Iterator<Item = Algorithm> {
        Self::ALL.into_iter().filter(move |a| a.problem_type() == problem)
    }

    /// Every parameter at its default value.
    #[must_use]
    pub fn default_hyperparameters(self) -> Hyperparameters {
        self.params().iter().map(|spec| (spec.key.to_string(), spec.default.to_value())).collect()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| CatalogError::UnknownAlgorithm(needle.to_string()))
    }
}

/// Check `algorithm` against the requested problem type.
pub fn ensure_problem_type(algorithm: Algorithm, requested: ProblemType) -> Result<(), CatalogError> {
    let expected = algorithm.problem_type();
    if expected == requested {
        Ok(())
    } else {
        Err(CatalogError::ProblemTypeMismatch { algorithm: algorithm.id(), expected, requested })
    }
}

/// Validate `supplied` against the schema and fill missing keys with defaults.
///
/// Text forms of choice options ("false", "rbf") are normalized to the typed
/// option.
pub fn resolve_hyperparameters(
    algorithm: Algorithm,
    supplied: &Hyperparameters,
) -> Result<Hyperparameters, CatalogError> {
    let specs = algorithm.params();
    for key in supplied.keys() {
        if !specs.iter().any(|spec| spec.key == key) {
            return Err(CatalogError::UnknownParameter {
                algorithm: algorithm.id(),
                key: key.clone(),
            });
        }
    }

    let mut resolved = Hyperparameters::new();
    for spec in specs {
        let value = match supplied.get(spec.key) {
            Some(value) => check_value(spec, value)?,
            None => spec.default.to_value(),
        };
        resolved.insert(spec.key.to_string(), value);
    }
    Ok(resolved)
}

fn check_value(spec: &ParamSpec, value: &ParamValue) -> Result<ParamValue, CatalogError> {
    match spec.kind {
        ParamKind::Range { min, max, step } => {
            let number = match value {
                ParamValue::Number(n) => Some(*n),
                ParamValue::Text(text) => text.trim().parse::<f64>().ok(),
                ParamValue::Bool(_) => None,
            };
            match number {
                Some(n) if n.is_finite() && (min..=max).contains(&n) => {
                    if on_step(n, min, step) {
                        Ok(ParamValue::Number(n))
                    } else {
                        Err(CatalogError::OffStep { key: spec.key, min, step, value: value.clone() })
                    }
                }
                _ => Err(CatalogError::OutOfRange { key: spec.key, min, max, value: value.clone() }),
            }
        }
        ParamKind::Choice(options) => options
            .iter()
            .find(|option| option.matches(value))
            .map(|option| option.to_value())
            .ok_or_else(|| CatalogError::NotAnOption {
                key: spec.key,
                options: options
                    .iter()
                    .map(|o| o.to_value().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                value: value.clone(),
            }),
    }
}

/// Slider values sit on `min + k * step`. Decimal steps such as 0.01 are
/// not exact in binary.
fn on_step(value: f64, min: f64, step: f64) -> bool {
    if step <= 0.0 {
        return true;
    }
    let steps = (value - min) / step;
    (steps - steps.round()).abs() < STEP_TOLERANCE
}

const STEP_TOLERANCE: f64 = 1e-6;
