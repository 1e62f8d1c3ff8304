//! The simulated training curve.
//!
//! A [`TrainingCurve`] advances one tick at a time. Every value it reports is
//! a function of the accumulated progress plus bounded noise, so the epoch
//! shown never depends on how many ticks happened to fire.

use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Progress is a percentage and saturates here.
pub const MAX_PROGRESS: f64 = 100.0;

const MAX_STEP: f64 = 5.0;
const LOSS_FLOOR: f64 = 0.01;
const LOSS_DECAY: f64 = 120.0;
const LOSS_NOISE: f64 = 0.1;
const ACCURACY_CAP: f64 = 0.99;
const ACCURACY_SCALE: f64 = 110.0;
const ACCURACY_NOISE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub epoch: u32,
    pub value: f64,
}

/// State after a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub tick: u64,
    pub progress: f64,
    pub epoch: u32,
    pub loss: f64,
    pub accuracy: f64,
}

impl TickOutcome {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress >= MAX_PROGRESS
    }
}

/// Point-in-time copy of a curve, including its display histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSnapshot {
    pub ticks: u64,
    pub progress: f64,
    pub epoch: u32,
    pub loss: f64,
    pub accuracy: f64,
    pub loss_history: Vec<CurvePoint>,
    pub accuracy_history: Vec<CurvePoint>,
}

#[derive(Debug, Clone)]
pub struct TrainingCurve {
    ticks: u64,
    progress: f64,
    epoch: u32,
    loss: f64,
    accuracy: f64,
    history_len: usize,
    loss_history: VecDeque<CurvePoint>,
    accuracy_history: VecDeque<CurvePoint>,
}

impl TrainingCurve {
    /// A fresh curve keeping at most `history_len` points per history.
    #[must_use]
    pub fn new(history_len: usize) -> Self {
        let history_len = history_len.max(1);
        Self {
            ticks: 0,
            progress: 0.0,
            epoch: 0,
            loss: 1.0,
            accuracy: 0.0,
            history_len,
            loss_history: VecDeque::with_capacity(history_len),
            accuracy_history: VecDeque::with_capacity(history_len),
        }
    }

    /// Epoch reached at a given progress.
    #[must_use]
    pub fn epoch_for(progress: f64) -> u32 {
        (progress / 10.0).floor() as u32 + 1
    }

    /// Apply one tick. Draw order is progress step, loss noise, accuracy noise.
    pub fn advance(&mut self, rng: &mut dyn RandomSource) -> TickOutcome {
        let step = rng.uniform(0.0, MAX_STEP);
        self.progress = (self.progress + step).min(MAX_PROGRESS);
        self.epoch = Self::epoch_for(self.progress);
        self.loss = (1.0 - self.progress / LOSS_DECAY + rng.uniform(0.0, LOSS_NOISE)).max(LOSS_FLOOR);
        self.accuracy =
            (self.progress / ACCURACY_SCALE + rng.uniform(0.0, ACCURACY_NOISE)).min(ACCURACY_CAP);
        self.ticks += 1;

        push_bounded(
            &mut self.loss_history,
            CurvePoint { epoch: self.epoch, value: self.loss },
            self.history_len,
        );
        push_bounded(
            &mut self.accuracy_history,
            CurvePoint { epoch: self.epoch, value: self.accuracy },
            self.history_len,
        );

        self.outcome()
    }

    #[must_use]
    pub fn outcome(&self) -> TickOutcome {
        TickOutcome {
            tick: self.ticks,
            progress: self.progress,
            epoch: self.epoch,
            loss: self.loss,
            accuracy: self.accuracy,
        }
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress >= MAX_PROGRESS
    }

    #[must_use]
    pub fn loss_history(&self) -> &VecDeque<CurvePoint> {
        &self.loss_history
    }

    #[must_use]
    pub fn accuracy_history(&self) -> &VecDeque<CurvePoint> {
        &self.accuracy_history
    }

    #[must_use]
    pub fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot {
            ticks: self.ticks,
            progress: self.progress,
            epoch: self.epoch,
            loss: self.loss,
            accuracy: self.accuracy,
            loss_history: self.loss_history.iter().copied().collect(),
            accuracy_history: self.accuracy_history.iter().copied().collect(),
        }
    }
}

fn push_bounded(history: &mut VecDeque<CurvePoint>, point: CurvePoint, cap: usize) {
    while history.len() >= cap {
        history.pop_front();
    }
    history.push_back(point);
}
