//! Dataset store.

use crate::error::{Result, WorkbenchError};
use crate::models::{Dataset, DatasetDraft, DatasetId, DatasetPatch};
use crate::storage::MemoryRepository;
use chrono::Utc;
use std::time::Duration;
use tracing::info;

/// Owns every uploaded dataset.
#[derive(Debug)]
pub struct DatasetStore {
    repo: MemoryRepository<Dataset>,
}

impl DatasetStore {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self { repo: MemoryRepository::new(latency) }
    }

    pub async fn list(&self) -> Vec<Dataset> {
        self.repo.list().await
    }

    pub async fn get(&self, id: DatasetId) -> Result<Dataset> {
        Ok(self.repo.get(id).await?)
    }

    pub async fn exists(&self, id: DatasetId) -> bool {
        self.repo.get(id).await.is_ok()
    }

    pub async fn create(&self, draft: DatasetDraft) -> Result<Dataset> {
        draft.validate()?;
        let dataset = self.repo.insert(draft.into_dataset(Utc::now())).await;
        info!(
            dataset_id = dataset.id,
            name = %dataset.name,
            rows = dataset.rows.len(),
            "dataset created"
        );
        Ok(dataset)
    }

    pub async fn update(&self, id: DatasetId, patch: DatasetPatch) -> Result<Dataset> {
        let (dataset, ()) = self
            .repo
            .modify(id, |dataset| patch.apply(dataset).map_err(WorkbenchError::from))
            .await?;
        Ok(dataset)
    }

    /// Models that reference the dataset are left as they are.
    pub async fn delete(&self, id: DatasetId) -> Result<Dataset> {
        let dataset = self.repo.delete(id).await?;
        info!(dataset_id = id, "dataset deleted");
        Ok(dataset)
    }

    pub async fn len(&self) -> usize {
        self.repo.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.repo.is_empty().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{record, Shape};

    fn draft(name: &str) -> DatasetDraft {
        DatasetDraft {
            name: name.into(),
            columns: vec!["x".into(), "target".into()],
            rows: vec![record([("x", 1), ("target", 0)]), record([("x", 2), ("target", 1)])],
        }
    }

    #[tokio::test]
    async fn test_create_get_round_trip() {
        let store = DatasetStore::new(Duration::ZERO);
        let created = store.create(draft("a.csv")).await.unwrap();
        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.shape(), Shape { row_count: 2, column_count: 2 });
    }

    #[tokio::test]
    async fn test_create_rejects_ragged_rows() {
        let store = DatasetStore::new(Duration::ZERO);
        let mut bad = draft("bad.csv");
        bad.rows.push(record([("x", 3)]));
        let err = store.create(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_keeps_invariant() {
        let store = DatasetStore::new(Duration::ZERO);
        let created = store.create(draft("a.csv")).await.unwrap();

        let patch = DatasetPatch { columns: Some(vec!["x".into()]), ..DatasetPatch::default() };
        let err = store.update(created.id, patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(store.get(created.id).await.unwrap().columns.len(), 2);

        let renamed = store
            .update(created.id, DatasetPatch { name: Some("b.csv".into()), ..DatasetPatch::default() })
            .await
            .unwrap();
        assert_eq!(renamed.name, "b.csv");
        assert_eq!(renamed.uploaded_at, created.uploaded_at);
    }

    #[tokio::test]
    async fn test_missing_dataset_is_not_found() {
        let store = DatasetStore::new(Duration::ZERO);
        assert_eq!(store.get(1).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.delete(1).await.unwrap_err().kind(), ErrorKind::NotFound);
        let err = store.update(1, DatasetPatch::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
