//! The `Workbench` wires every component from one configuration.
//!
//! ```no_run
//! # async fn demo() -> trainlab_core::Result<()> {
//! use trainlab_core::{Algorithm, ModelDraft, Workbench, WorkbenchConfig};
//!
//! let workbench = Workbench::new(WorkbenchConfig::default())?;
//! let dataset = workbench.init().await?.expect("sample data is seeded by default");
//! let model = workbench
//!     .registry()
//!     .create(ModelDraft::new("forest", Algorithm::RandomForest, dataset.id))
//!     .await?;
//! workbench.simulator().start(model.id, dataset.id).await?;
//! workbench.teardown().await;
//! # Ok(())
//! # }
//! ```

use crate::config::WorkbenchConfig;
use crate::datasets::DatasetStore;
use crate::error::Result;
use crate::evaluation::ModelEvaluator;
use crate::ingest::{CsvIngestor, Ingestor};
use crate::models::{sample_dataset_draft, Dataset};
use crate::prediction::PredictionEngine;
use crate::registry::ModelRegistry;
use crate::training::TrainingSimulator;
use std::sync::Arc;
use tracing::info;
use trainlab_training::{
    EntropyRandomFactory, ProgressSink, RandomFactory, SeededRandomFactory, TracingProgressSink,
};

pub struct Workbench {
    config: WorkbenchConfig,
    datasets: Arc<DatasetStore>,
    registry: Arc<ModelRegistry>,
    simulator: TrainingSimulator,
    predictor: PredictionEngine,
    evaluator: ModelEvaluator,
    ingestor: Box<dyn Ingestor>,
}

impl Workbench {
    /// Entropy-seeded randomness (or the configured seed) and tracing output.
    pub fn new(config: WorkbenchConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    #[must_use]
    pub fn builder(config: WorkbenchConfig) -> WorkbenchBuilder {
        WorkbenchBuilder { config, random: None, sink: None, ingestor: None }
    }

    #[must_use]
    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    #[must_use]
    pub fn datasets(&self) -> &Arc<DatasetStore> {
        &self.datasets
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn simulator(&self) -> &TrainingSimulator {
        &self.simulator
    }

    #[must_use]
    pub fn predictor(&self) -> &PredictionEngine {
        &self.predictor
    }

    #[must_use]
    pub fn evaluator(&self) -> &ModelEvaluator {
        &self.evaluator
    }

    /// Seed the sample dataset when configured to and the store is empty.
    pub async fn init(&self) -> Result<Option<Dataset>> {
        if !self.config.seed_sample_data || !self.datasets.is_empty().await {
            return Ok(None);
        }
        let dataset = self.datasets.create(sample_dataset_draft()).await?;
        info!(dataset_id = dataset.id, "sample dataset seeded");
        Ok(Some(dataset))
    }

    /// Parse an upload and store it as a new dataset.
    pub async fn ingest(&self, name: &str, bytes: &[u8]) -> Result<Dataset> {
        let draft = self.ingestor.parse(name, bytes).await?;
        self.datasets.create(draft).await
    }

    /// Finalize every running simulation.
    pub async fn teardown(&self) {
        let stopped = self.simulator.stop_all().await;
        info!(stopped, "workbench torn down");
    }
}

/// Overrides for the collaborators `Workbench::new` would pick.
pub struct WorkbenchBuilder {
    config: WorkbenchConfig,
    random: Option<Arc<dyn RandomFactory>>,
    sink: Option<Arc<dyn ProgressSink>>,
    ingestor: Option<Box<dyn Ingestor>>,
}

impl WorkbenchBuilder {
    #[must_use]
    pub fn random(mut self, random: Arc<dyn RandomFactory>) -> Self {
        self.random = Some(random);
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn ingestor(mut self, ingestor: Box<dyn Ingestor>) -> Self {
        self.ingestor = Some(ingestor);
        self
    }

    pub fn build(self) -> Result<Workbench> {
        let config = self.config;
        config.validate()?;

        let random: Arc<dyn RandomFactory> = match (self.random, config.simulation.seed) {
            (Some(random), _) => random,
            (None, Some(seed)) => Arc::new(SeededRandomFactory::new(seed)),
            (None, None) => Arc::new(EntropyRandomFactory),
        };
        let sink: Arc<dyn ProgressSink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(TracingProgressSink),
        };
        let ingestor: Box<dyn Ingestor> = match self.ingestor {
            Some(ingestor) => ingestor,
            None => Box::new(CsvIngestor),
        };

        let latency = config.store_latency();
        let datasets = Arc::new(DatasetStore::new(latency));
        let registry = Arc::new(ModelRegistry::new(Arc::clone(&datasets), latency));
        let simulator = TrainingSimulator::new(
            Arc::clone(&registry),
            config.simulation_settings(),
            Arc::clone(&random),
            sink,
        )?;
        let predictor = PredictionEngine::new(Arc::clone(&registry), random.as_ref());
        let evaluator = ModelEvaluator::new(Arc::clone(&registry), random.as_ref());

        Ok(Workbench {
            config,
            datasets,
            registry,
            simulator,
            predictor,
            evaluator,
            ingestor,
        })
    }
}
