use crate::curve::TickOutcome;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// How a simulated run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Progress reached 100 before finalization.
    Completed,
    /// Finalized early by an explicit stop.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { model_id: u64, session_id: u64 },
    Tick { model_id: u64, session_id: u64, outcome: TickOutcome },
    Finished { model_id: u64, session_id: u64, outcome: RunOutcome },
}

impl ProgressEvent {
    #[must_use]
    pub fn model_id(&self) -> u64 {
        match self {
            Self::Started { model_id, .. }
            | Self::Tick { model_id, .. }
            | Self::Finished { model_id, .. } => *model_id,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Logs every event through `tracing`; ticks at debug level.
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { model_id, session_id } => {
                tracing::info!(model_id, session_id, "training started");
            }
            ProgressEvent::Tick { model_id, session_id, outcome } => {
                tracing::debug!(
                    model_id,
                    session_id,
                    tick = outcome.tick,
                    progress = outcome.progress,
                    epoch = outcome.epoch,
                    loss = outcome.loss,
                    accuracy = outcome.accuracy,
                    "training tick"
                );
            }
            ProgressEvent::Finished { model_id, session_id, outcome } => {
                tracing::info!(model_id, session_id, ?outcome, "training finished");
            }
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemoryProgressSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Progress values recorded for one model, in tick order.
    #[must_use]
    pub fn progress_for(&self, model_id: u64) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Tick { model_id: id, outcome, .. } if id == model_id => {
                    Some(outcome.progress)
                }
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for MemoryProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
