//! `trainlab ingest <file>`

use super::{print_json, DatasetSummary};
use anyhow::{Context, Result};
use std::path::Path;
use trainlab_core::{Workbench, WorkbenchConfig};

pub async fn execute(config: WorkbenchConfig, file: &Path) -> Result<()> {
    let workbench = Workbench::new(config)?;
    let dataset = ingest_file(&workbench, file).await?;
    print_json(&DatasetSummary::from(&dataset))
}

pub async fn ingest_file(workbench: &Workbench, file: &Path) -> Result<trainlab_core::Dataset> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
    let dataset = workbench.ingest(&name, &bytes).await?;
    tracing::info!(dataset_id = dataset.id, file = %file.display(), "dataset ingested");
    Ok(dataset)
}
