//! In-memory repository shared by every store.
//!
//! A [`MemoryRepository`] owns one collection of entities. Reads clone
//! records out; writes go through a closure applied under the collection's
//! write lock, so a single update is atomic with respect to every other
//! caller. Concurrent updates of the same id are last-write-wins.

use crate::storage::error::{StorageError, StorageResult};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for entities that can be stored in a repository.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Collection name used in errors and logs.
    const COLLECTION: &'static str;

    /// Returns the ID of this entity.
    fn id(&self) -> u64;

    /// Overwrites the ID. Only the repository calls this.
    fn assign_id(&mut self, id: u64);
}

#[derive(Debug)]
struct Collection<T> {
    records: Vec<T>,
    /// Highest id ever issued; ids are never handed out twice.
    high_water: u64,
}

/// Insertion-ordered, lock-protected collection with simulated I/O latency.
#[derive(Debug)]
pub struct MemoryRepository<T> {
    state: RwLock<Collection<T>>,
    latency: Duration,
}

impl<T: Entity> MemoryRepository<T> {
    /// Creates an empty repository.
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self::with_records(Vec::new(), latency)
    }

    /// Creates a repository pre-populated with `records`, ids kept as given.
    #[must_use]
    pub fn with_records(records: Vec<T>, latency: Duration) -> Self {
        let high_water = records.iter().map(Entity::id).max().unwrap_or(0);
        Self { state: RwLock::new(Collection { records, high_water }), latency }
    }

    async fn simulate_io(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Retrieves all entities in insertion order.
    pub async fn list(&self) -> Vec<T> {
        self.simulate_io().await;
        self.state.read().await.records.clone()
    }

    /// Retrieves an entity by ID.
    pub async fn get(&self, id: u64) -> StorageResult<T> {
        self.simulate_io().await;
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound { collection: T::COLLECTION, id })
    }

    /// Stores `entity` under the next id and returns the persisted copy.
    ///
    /// The caller-supplied id is ignored.
    pub async fn insert(&self, mut entity: T) -> T {
        self.simulate_io().await;
        let mut state = self.state.write().await;
        let max_live = state.records.iter().map(Entity::id).max().unwrap_or(0);
        let id = state.high_water.max(max_live) + 1;
        state.high_water = id;
        entity.assign_id(id);
        state.records.push(entity.clone());
        debug!(collection = T::COLLECTION, id, "record inserted");
        entity
    }

    /// Applies `f` to the record with `id` and commits only if it succeeds.
    ///
    /// `f` runs on a copy while the write lock is held; on error the stored
    /// record is left untouched.
    pub async fn modify<F, R, E>(&self, id: u64, f: F) -> Result<(T, R), E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<StorageError>,
    {
        self.simulate_io().await;
        let mut state = self.state.write().await;
        let record = state
            .records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or(StorageError::NotFound { collection: T::COLLECTION, id })?;

        let mut candidate = record.clone();
        let out = f(&mut candidate)?;
        candidate.assign_id(id);
        *record = candidate.clone();
        debug!(collection = T::COLLECTION, id, "record updated");
        Ok((candidate, out))
    }

    /// Deletes an entity by ID and returns it.
    pub async fn delete(&self, id: u64) -> StorageResult<T> {
        self.simulate_io().await;
        let mut state = self.state.write().await;
        let index = state
            .records
            .iter()
            .position(|record| record.id() == id)
            .ok_or(StorageError::NotFound { collection: T::COLLECTION, id })?;
        debug!(collection = T::COLLECTION, id, "record deleted");
        Ok(state.records.remove(index))
    }

    /// Number of stored records, without simulated latency.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
