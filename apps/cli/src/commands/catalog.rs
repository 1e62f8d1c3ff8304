//! `trainlab catalog`

use super::print_json;
use anyhow::Result;
use serde::Serialize;
use trainlab_core::{Algorithm, ParamKind, ParamValue, ProblemType};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AlgorithmEntry {
    id: &'static str,
    name: &'static str,
    problem_type: ProblemType,
    params: Vec<ParamEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
enum ParamShape {
    Range { min: f64, max: f64, step: f64 },
    Choice { options: Vec<ParamValue> },
}

#[derive(Debug, Serialize)]
struct ParamEntry {
    key: &'static str,
    label: &'static str,
    #[serde(flatten)]
    shape: ParamShape,
    default: ParamValue,
}

pub fn execute(problem_type: Option<ProblemType>) -> Result<()> {
    let entries: Vec<AlgorithmEntry> = Algorithm::ALL
        .into_iter()
        .filter(|a| problem_type.is_none_or(|p| a.problem_type() == p))
        .map(entry)
        .collect();
    print_json(&entries)
}

fn entry(algorithm: Algorithm) -> AlgorithmEntry {
    AlgorithmEntry {
        id: algorithm.id(),
        name: algorithm.display_name(),
        problem_type: algorithm.problem_type(),
        params: algorithm
            .params()
            .iter()
            .map(|spec| ParamEntry {
                key: spec.key,
                label: spec.label,
                shape: match spec.kind {
                    ParamKind::Range { min, max, step } => ParamShape::Range { min, max, step },
                    ParamKind::Choice(options) => ParamShape::Choice {
                        options: options.iter().map(|o| o.to_value()).collect(),
                    },
                },
                default: spec.default.to_value(),
            })
            .collect(),
    }
}
