//! Command implementations for the Trainlab CLI.

pub mod catalog;
pub mod datasets;
pub mod ingest;
pub mod run;

use anyhow::Result;
use serde::Serialize;
use trainlab_core::{Dataset, DatasetId, Shape, Workbench, WorkbenchConfig};

/// Build a workbench and seed it according to `config`.
pub async fn open_workbench(config: WorkbenchConfig) -> Result<Workbench> {
    let workbench = Workbench::new(config)?;
    workbench.init().await?;
    Ok(workbench)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Dataset without its rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub name: String,
    pub columns: Vec<String>,
    pub shape: Shape,
    pub feature_columns: Vec<String>,
}

impl From<&Dataset> for DatasetSummary {
    fn from(dataset: &Dataset) -> Self {
        Self {
            id: dataset.id,
            name: dataset.name.clone(),
            columns: dataset.columns.clone(),
            shape: dataset.shape(),
            feature_columns: dataset.feature_columns().into_iter().map(str::to_string).collect(),
        }
    }
}
