//! Trainlab Training
//!
//! Backend-agnostic primitives for simulated model training:
//! - Problem types and final metric bundles (`ModelMetrics`)
//! - Injectable random sources (`RandomSource`, `RandomFactory`)
//! - The tick-by-tick training curve (`TrainingCurve`)
//! - Progress events and sinks (`ProgressEvent`, `ProgressSink`)
//! - Simulation cadence settings (`SimulationSettings`)

pub mod curve;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod random;
pub mod settings;

pub use curve::{CurvePoint, CurveSnapshot, TickOutcome, TrainingCurve, MAX_PROGRESS};
pub use error::{TrainingError, TrainingResult};
pub use metrics::{
    draw_final_metrics, ClassificationMetrics, ModelMetrics, ProblemType, RegressionMetrics,
};
pub use progress::{
    MemoryProgressSink, NullProgressSink, ProgressEvent, ProgressSink, RunOutcome,
    TracingProgressSink,
};
pub use random::{
    EntropyRandomFactory, RandomFactory, RandomSource, ScriptedRandom, ScriptedRandomFactory,
    SeededRandomFactory, StdRandom,
};
pub use settings::SimulationSettings;
