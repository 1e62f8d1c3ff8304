//! Shared helpers for Trainlab Core integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use trainlab_core::{
    Algorithm, DatasetId, ModelConfig, ModelDraft, Workbench, WorkbenchConfig,
};
use trainlab_training::{MemoryProgressSink, RandomFactory, ScriptedRandomFactory};

/// Default cadence: 500 ms ticks, 1 s grace period.
pub const TICK_MS: u64 = 500;
pub const GRACE_MS: u64 = 1000;

pub struct Harness {
    pub workbench: Workbench,
    pub sink: Arc<MemoryProgressSink>,
    pub dataset_id: DatasetId,
}

impl Harness {
    pub async fn model(&self, algorithm: Algorithm) -> ModelConfig {
        self.workbench
            .registry()
            .create(ModelDraft::new(algorithm.display_name(), algorithm, self.dataset_id))
            .await
            .expect("model should be created")
    }
}

/// Workbench with the sample dataset seeded and every draw scripted.
pub async fn scripted(draws: Vec<f64>) -> Harness {
    with_random(Arc::new(ScriptedRandomFactory::new(draws))).await
}

pub async fn with_random(random: Arc<dyn RandomFactory>) -> Harness {
    with_config(WorkbenchConfig::default(), random).await
}

/// 1 ms ticks and no grace period, for tests on real time.
pub fn fast_config() -> WorkbenchConfig {
    let mut config = WorkbenchConfig::default();
    config.simulation.tick_interval_ms = 1;
    config.simulation.grace_period_ms = 0;
    config
}

pub async fn with_config(config: WorkbenchConfig, random: Arc<dyn RandomFactory>) -> Harness {
    let sink = Arc::new(MemoryProgressSink::new());
    let workbench = Workbench::builder(config)
        .random(random)
        .sink(sink.clone())
        .build()
        .expect("config is valid");
    let dataset = workbench.init().await.unwrap().expect("sample dataset is seeded");
    Harness { workbench, sink, dataset_id: dataset.id }
}

/// Long enough for `ticks` ticks plus the grace period to elapse.
pub fn run_time(ticks: u64) -> std::time::Duration {
    std::time::Duration::from_millis(ticks * TICK_MS + GRACE_MS + TICK_MS / 2)
}
