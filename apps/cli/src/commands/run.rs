//! `trainlab run`: the whole lifecycle in one command.

use super::ingest::ingest_file;
use super::{open_workbench, print_json};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use trainlab_core::{
    Algorithm, EvaluationReport, Hyperparameters, ModelConfig, ModelDraft, ModelId,
    PredictionResult, ProblemType, ProgressEvent, TrainingSession, Workbench, WorkbenchConfig,
};

#[derive(Debug)]
pub struct RunOptions {
    pub algorithm: Algorithm,
    pub problem_type: Option<ProblemType>,
    pub params: Hyperparameters,
    pub dataset: Option<PathBuf>,
    pub stop_after_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    model: ModelConfig,
    session: TrainingSession,
    prediction: PredictionResult,
    evaluation: EvaluationReport,
}

pub async fn execute(config: WorkbenchConfig, options: RunOptions) -> Result<()> {
    let workbench = open_workbench(config).await?;
    let result = run(&workbench, options).await;
    workbench.teardown().await;
    print_json(&result?)
}

async fn run(workbench: &Workbench, options: RunOptions) -> Result<RunReport> {
    let dataset_id = match &options.dataset {
        Some(path) => ingest_file(workbench, path).await?.id,
        None => workbench
            .datasets()
            .list()
            .await
            .first()
            .map(|d| d.id)
            .ok_or_else(|| anyhow!("No dataset available; pass --dataset or enable seed_sample_data"))?,
    };

    let mut draft = ModelDraft::new(options.algorithm.display_name(), options.algorithm, dataset_id)
        .with_hyperparameters(options.params);
    if let Some(problem_type) = options.problem_type {
        draft.problem_type = problem_type;
    }
    let model = workbench.registry().create(draft).await?;

    let mut events = workbench.simulator().subscribe();
    let session = workbench.simulator().start(model.id, dataset_id).await?;

    match options.stop_after_ms {
        Some(ms) => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            workbench.simulator().stop(model.id).await?;
        }
        None => wait_until_finished(&mut events, model.id).await,
    }

    let session = workbench.registry().get_session(session.id).await?;
    let model = workbench.registry().get(model.id).await?;
    let features = workbench
        .predictor()
        .feature_template(model.id)
        .await
        .context("Failed to build feature inputs")?;
    let prediction = workbench.predictor().predict(model.id, &features).await?;
    let evaluation = workbench.evaluator().evaluate(model.id).await?;

    Ok(RunReport { model, session, prediction, evaluation })
}

async fn wait_until_finished(
    events: &mut tokio::sync::broadcast::Receiver<ProgressEvent>,
    model_id: ModelId,
) {
    loop {
        match events.recv().await {
            Ok(ProgressEvent::Finished { model_id: id, .. }) if id == model_id => break,
            Ok(ProgressEvent::Tick { model_id: id, outcome, .. }) if id == model_id => {
                tracing::info!(progress = outcome.progress, epoch = outcome.epoch, "training");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "progress events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
