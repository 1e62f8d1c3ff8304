//! Storage layer for Trainlab Core.
//!
//! Every store keeps its records in a [`MemoryRepository`], an in-process
//! stand-in for a database with simulated latency.

pub mod error;
pub mod repository;

pub use error::{StorageError, StorageResult};
pub use repository::{Entity, MemoryRepository};
