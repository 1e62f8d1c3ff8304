//! Training simulation runtime.
//!
//! The curve math and metric draws live in `trainlab-training`; this module
//! schedules them and writes the results back into the registry.

pub mod simulator;

pub use simulator::TrainingSimulator;
