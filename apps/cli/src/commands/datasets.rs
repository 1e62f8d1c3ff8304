//! `trainlab datasets`

use super::{open_workbench, print_json, DatasetSummary};
use anyhow::Result;
use trainlab_core::WorkbenchConfig;

pub async fn execute(config: WorkbenchConfig) -> Result<()> {
    let workbench = open_workbench(config).await?;
    let summaries: Vec<DatasetSummary> =
        workbench.datasets().list().await.iter().map(DatasetSummary::from).collect();
    print_json(&summaries)
}
