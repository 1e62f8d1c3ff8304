//! Training simulator runtime.
//!
//! Each started model gets one spawned task that advances a
//! [`TrainingCurve`] on a fixed interval. The task owns finalization: once
//! progress reaches 100 it waits out the grace period, and on cancellation it
//! stops immediately. Either way it draws final metrics, completes the model
//! in the registry, closes the session and leaves the run table before
//! announcing [`ProgressEvent::Finished`]. [`TrainingSimulator::stop`] only
//! signals the task and waits for it, so no tick can land after it returns.

use crate::error::{Result, WorkbenchError};
use crate::models::{DatasetId, ModelId, ModelStatus, SessionId, TrainingSession};
use crate::registry::ModelRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use trainlab_training::{
    draw_final_metrics, CurveSnapshot, ProblemType, ProgressEvent, ProgressSink, RandomFactory,
    RandomSource, RunOutcome, SimulationSettings, TrainingCurve,
};

const EVENT_CAPACITY: usize = 256;

struct RunState {
    curve: TrainingCurve,
    rng: Box<dyn RandomSource>,
}

type SharedRunState = Arc<StdMutex<RunState>>;

fn lock(state: &SharedRunState) -> std::sync::MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ActiveRun {
    session_id: SessionId,
    state: SharedRunState,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<Result<TrainingSession>>,
}

struct Inner {
    registry: Arc<ModelRegistry>,
    settings: SimulationSettings,
    random: Arc<dyn RandomFactory>,
    sink: Arc<dyn ProgressSink>,
    events: broadcast::Sender<ProgressEvent>,
    runs: Mutex<HashMap<ModelId, ActiveRun>>,
    /// Models whose `start` is between its conflict check and registration.
    starting: StdMutex<HashSet<ModelId>>,
}

impl Inner {
    fn publish(&self, event: ProgressEvent) {
        self.sink.on_event(event.clone());
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Holds a model's place in `starting`; released on drop, so an abandoned
/// `start` future cannot wedge the model.
struct Reservation<'a> {
    starting: &'a StdMutex<HashSet<ModelId>>,
    model_id: ModelId,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.starting.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.model_id);
    }
}

/// Drives simulated training runs, at most one per model.
#[derive(Clone)]
pub struct TrainingSimulator {
    inner: Arc<Inner>,
}

impl TrainingSimulator {
    pub fn new(
        registry: Arc<ModelRegistry>,
        settings: SimulationSettings,
        random: Arc<dyn RandomFactory>,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self> {
        settings.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                settings,
                random,
                sink,
                events,
                runs: Mutex::new(HashMap::new()),
                starting: StdMutex::new(HashSet::new()),
            }),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &SimulationSettings {
        &self.inner.settings
    }

    /// Start simulating `model_id` against `dataset_id` and return the new
    /// running session.
    ///
    /// A `configured` model is moved to `training`; a `training` or `trained`
    /// model is re-run in place and its metrics are overwritten at the end.
    /// Fails with `Conflict` while another run of the model is active or
    /// still starting.
    pub async fn start(&self, model_id: ModelId, dataset_id: DatasetId) -> Result<TrainingSession> {
        let inner = &self.inner;
        let reservation = {
            let runs = inner.runs.lock().await;
            let mut starting = inner.starting.lock().unwrap_or_else(PoisonError::into_inner);
            if runs.contains_key(&model_id) || !starting.insert(model_id) {
                return Err(WorkbenchError::Conflict { model_id });
            }
            Reservation { starting: &inner.starting, model_id }
        };

        let model = inner.registry.get(model_id).await?;
        inner.registry.datasets().get(dataset_id).await?;
        if model.status == ModelStatus::Configured {
            inner.registry.mark_training(model_id).await?;
        }
        let session = inner.registry.open_session(model_id, dataset_id).await;

        let state = Arc::new(StdMutex::new(RunState {
            curve: TrainingCurve::new(inner.settings.history_len),
            rng: inner.random.create(),
        }));
        let (cancel, cancel_rx) = watch::channel(false);

        let mut runs = inner.runs.lock().await;
        inner.publish(ProgressEvent::Started { model_id, session_id: session.id });
        let handle = tokio::spawn(drive(
            Arc::clone(inner),
            RunContext {
                model_id,
                session_id: session.id,
                problem_type: model.problem_type,
                state: Arc::clone(&state),
            },
            cancel_rx,
        ));
        runs.insert(model_id, ActiveRun { session_id: session.id, state, cancel, handle });
        drop(runs);
        drop(reservation);

        info!(model_id, session_id = session.id, dataset_id, "simulation started");
        Ok(session)
    }

    /// Finalize the model's active simulation, if any.
    ///
    /// Returns the closed session, or `None` when nothing was running. Calling
    /// it twice is harmless.
    pub async fn stop(&self, model_id: ModelId) -> Result<Option<TrainingSession>> {
        let run = self.inner.runs.lock().await.remove(&model_id);
        let Some(run) = run else {
            debug!(model_id, "stop requested with no active simulation");
            return Ok(None);
        };

        let _ = run.cancel.send(true);
        match run.handle.await {
            Ok(result) => result.map(Some),
            Err(join_err) if join_err.is_panic() => std::panic::resume_unwind(join_err.into_panic()),
            Err(join_err) => {
                warn!(model_id, session_id = run.session_id, error = %join_err, "simulation task cancelled");
                Ok(None)
            }
        }
    }

    /// Stop every active simulation. Used on teardown.
    pub async fn stop_all(&self) -> usize {
        let model_ids: Vec<ModelId> = self.inner.runs.lock().await.keys().copied().collect();
        let mut stopped = 0;
        for model_id in model_ids {
            match self.stop(model_id).await {
                Ok(Some(_)) => stopped += 1,
                Ok(None) => {}
                Err(e) => warn!(model_id, error = %e, "failed to finalize simulation"),
            }
        }
        stopped
    }

    /// Whether a registered run exists. A `start` still doing its lookups
    /// does not count.
    pub async fn is_active(&self, model_id: ModelId) -> bool {
        self.inner.runs.lock().await.contains_key(&model_id)
    }

    /// Current curve of the model's active run.
    pub async fn snapshot(&self, model_id: ModelId) -> Option<CurveSnapshot> {
        let state = {
            let runs = self.inner.runs.lock().await;
            Arc::clone(&runs.get(&model_id)?.state)
        };
        let snapshot = lock(&state).curve.snapshot();
        Some(snapshot)
    }

    /// Every event published from now on, for all models.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.inner.events.subscribe()
    }
}

struct RunContext {
    model_id: ModelId,
    session_id: SessionId,
    problem_type: ProblemType,
    state: SharedRunState,
}

async fn drive(
    inner: Arc<Inner>,
    run: RunContext,
    mut cancel: watch::Receiver<bool>,
) -> Result<TrainingSession> {
    let period = inner.settings.tick_interval;
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cancelled = false;
    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => {
                cancelled = true;
                break;
            }
            _ = interval.tick() => {
                let outcome = {
                    let mut guard = lock(&run.state);
                    let RunState { curve, rng } = &mut *guard;
                    curve.advance(rng.as_mut())
                };
                inner.publish(ProgressEvent::Tick {
                    model_id: run.model_id,
                    session_id: run.session_id,
                    outcome,
                });
                if let Err(e) = inner.registry.record_progress(run.session_id, outcome.progress).await {
                    warn!(model_id = run.model_id, session_id = run.session_id, error = %e, "failed to record progress");
                }
                if outcome.is_finished() {
                    break;
                }
            }
        }
    }

    if !cancelled {
        tokio::select! {
            biased;
            _ = cancel.changed() => {}
            () = time::sleep(inner.settings.grace_period) => {}
        }
    }

    let finalized = finalize(&inner, &run).await;

    // `stop` may already have taken the entry, or a newer run may own it.
    {
        let mut runs = inner.runs.lock().await;
        if runs.get(&run.model_id).is_some_and(|active| active.session_id == run.session_id) {
            runs.remove(&run.model_id);
        }
    }

    let Finalized { session, outcome, completion } = finalized?;
    inner.publish(ProgressEvent::Finished {
        model_id: run.model_id,
        session_id: run.session_id,
        outcome,
    });
    completion?;

    info!(model_id = run.model_id, session_id = run.session_id, ?outcome, "simulation finalized");
    Ok(session)
}

struct Finalized {
    session: TrainingSession,
    outcome: RunOutcome,
    completion: Result<()>,
}

async fn finalize(inner: &Inner, run: &RunContext) -> Result<Finalized> {
    let (metrics, finished) = {
        let mut guard = lock(&run.state);
        let RunState { curve, rng } = &mut *guard;
        (draw_final_metrics(run.problem_type, rng.as_mut()), curve.is_finished())
    };
    let outcome = if finished { RunOutcome::Completed } else { RunOutcome::Stopped };

    let completion = inner.registry.complete_training(run.model_id, metrics.clone()).await;
    if let Err(e) = &completion {
        warn!(model_id = run.model_id, error = %e, "could not complete training");
    }
    let session = inner.registry.close_session(run.session_id, outcome, Some(metrics)).await?;
    Ok(Finalized { session, outcome, completion: completion.map(|_| ()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Algorithm;
    use crate::datasets::DatasetStore;
    use crate::models::{sample_dataset_draft, ModelDraft, SessionStatus};
    use std::time::Duration;
    use trainlab_training::{MemoryProgressSink, ScriptedRandomFactory};

    struct Fixture {
        simulator: TrainingSimulator,
        registry: Arc<ModelRegistry>,
        sink: Arc<MemoryProgressSink>,
        model_id: ModelId,
        dataset_id: DatasetId,
    }

    async fn fixture(draw: f64) -> Fixture {
        fixture_with_latency(draw, Duration::ZERO).await
    }

    async fn fixture_with_latency(draw: f64, latency: Duration) -> Fixture {
        let datasets = Arc::new(DatasetStore::new(latency));
        let dataset = datasets.create(sample_dataset_draft()).await.unwrap();
        let registry = Arc::new(ModelRegistry::new(datasets, latency));
        let model = registry
            .create(ModelDraft::new("m", Algorithm::LogisticRegression, dataset.id))
            .await
            .unwrap();
        let sink = Arc::new(MemoryProgressSink::new());
        let simulator = TrainingSimulator::new(
            Arc::clone(&registry),
            SimulationSettings::default(),
            Arc::new(ScriptedRandomFactory::new(vec![draw])),
            sink.clone(),
        )
        .unwrap();
        Fixture { simulator, registry, sink, model_id: model.id, dataset_id: dataset.id }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_to_completion_after_grace_period() {
        let f = fixture(0.5).await;
        let session = f.simulator.start(f.model_id, f.dataset_id).await.unwrap();
        assert_eq!(f.registry.get(f.model_id).await.unwrap().status, ModelStatus::Training);

        // 2.5 per tick: 40 ticks of 500 ms, then a 1 s grace period.
        time::sleep(Duration::from_millis(40 * 500 + 500)).await;
        assert!(f.simulator.is_active(f.model_id).await);
        assert_eq!(f.registry.get(f.model_id).await.unwrap().status, ModelStatus::Training);

        time::sleep(Duration::from_millis(1000)).await;
        assert!(!f.simulator.is_active(f.model_id).await);

        let model = f.registry.get(f.model_id).await.unwrap();
        assert_eq!(model.status, ModelStatus::Trained);
        assert!(model.metrics.is_some());

        let session = f.registry.get_session(session.id).await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.progress, 100.0);
        assert_eq!(f.sink.progress_for(f.model_id).len(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_conflicts() {
        let f = fixture(0.5).await;
        f.simulator.start(f.model_id, f.dataset_id).await.unwrap();
        let err = f.simulator.start(f.model_id, f.dataset_id).await.unwrap_err();
        assert!(matches!(err, WorkbenchError::Conflict { .. }));
        f.simulator.stop(f.model_id).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_final() {
        let f = fixture(0.5).await;
        f.simulator.start(f.model_id, f.dataset_id).await.unwrap();
        time::sleep(Duration::from_millis(1600)).await;

        let session = f.simulator.stop(f.model_id).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Stopped);
        assert!(session.progress < 100.0);
        assert!(f.simulator.stop(f.model_id).await.unwrap().is_none());

        let ticks = f.sink.progress_for(f.model_id).len();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(f.sink.progress_for(f.model_id).len(), ticks);
        assert_eq!(f.registry.get(f.model_id).await.unwrap().status, ModelStatus::Trained);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_tracks_active_run() {
        let f = fixture(0.5).await;
        assert!(f.simulator.snapshot(f.model_id).await.is_none());
        f.simulator.start(f.model_id, f.dataset_id).await.unwrap();
        time::sleep(Duration::from_millis(1100)).await;

        let snapshot = f.simulator.snapshot(f.model_id).await.unwrap();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.progress, 5.0);
        assert_eq!(snapshot.loss_history.len(), 2);
        f.simulator.stop(f.model_id).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_model_or_dataset() {
        let f = fixture(0.5).await;
        let err = f.simulator.start(99, f.dataset_id).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        let err = f.simulator.start(f.model_id, 99).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert_eq!(f.registry.get(f.model_id).await.unwrap().status, ModelStatus::Configured);

        // A failed start releases the model.
        f.simulator.start(f.model_id, f.dataset_id).await.unwrap();
        f.simulator.stop(f.model_id).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_start_leaves_other_models_responsive() {
        let f = fixture_with_latency(0.5, Duration::from_millis(200)).await;
        let other = f
            .registry
            .create(ModelDraft::new("other", Algorithm::Svm, f.dataset_id))
            .await
            .unwrap();

        let simulator = f.simulator.clone();
        let (model_id, dataset_id) = (f.model_id, f.dataset_id);
        let pending = tokio::spawn(async move { simulator.start(model_id, dataset_id).await });
        time::sleep(Duration::from_millis(1)).await;

        let err = f.simulator.start(f.model_id, f.dataset_id).await.unwrap_err();
        assert!(matches!(err, WorkbenchError::Conflict { .. }));

        let quick = Duration::from_millis(1);
        assert!(!time::timeout(quick, f.simulator.is_active(other.id)).await.unwrap());
        assert!(time::timeout(quick, f.simulator.stop(other.id)).await.unwrap().unwrap().is_none());
        assert!(time::timeout(quick, f.simulator.snapshot(other.id)).await.unwrap().is_none());
        assert!(!f.simulator.is_active(f.model_id).await);

        let session = pending.await.unwrap().unwrap();
        assert_eq!(session.model_id, f.model_id);
        assert!(f.simulator.is_active(f.model_id).await);
        f.simulator.stop(f.model_id).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_is_gone_when_finished_is_published() {
        let f = fixture(1.0).await;
        let mut events = f.simulator.subscribe();
        let session = f.simulator.start(f.model_id, f.dataset_id).await.unwrap();

        loop {
            if let ProgressEvent::Finished { session_id, .. } = events.recv().await.unwrap() {
                assert_eq!(session_id, session.id);
                break;
            }
        }
        assert!(!f.simulator.is_active(f.model_id).await);
        f.simulator.start(f.model_id, f.dataset_id).await.unwrap();
        f.simulator.stop(f.model_id).await.unwrap();
    }
}
