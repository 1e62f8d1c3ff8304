//! Tabular datasets.
//!
//! A dataset is a named, ordered list of columns plus rows whose key set is
//! exactly that column list. Shape is always derived, never stored. It is
//! still written out on serialization and ignored when reading back.

use crate::storage::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub type DatasetId = u64;

/// Column names that are treated as the prediction target, not a feature.
const TARGET_COLUMNS: &[&str] = &["target", "label", "class", "species", "price"];

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One row, keyed by column name.
pub type Record = BTreeMap<String, Scalar>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub row_count: usize,
    pub column_count: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("dataset name is required")]
    EmptyName,
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("row {row} has keys {found:?}, expected exactly the dataset columns")]
    RowMismatch { row: usize, found: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetView<'a> {
    id: DatasetId,
    name: &'a str,
    columns: &'a [String],
    rows: &'a [Record],
    shape: Shape,
    uploaded_at: DateTime<Utc>,
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DatasetView {
            id: self.id,
            name: &self.name,
            columns: &self.columns,
            rows: &self.rows,
            shape: self.shape(),
            uploaded_at: self.uploaded_at,
        }
        .serialize(serializer)
    }
}

impl Dataset {
    #[must_use]
    pub fn shape(&self) -> Shape {
        Shape { row_count: self.rows.len(), column_count: self.columns.len() }
    }

    pub fn validate(&self) -> Result<(), DatasetError> {
        validate_table(&self.name, &self.columns, &self.rows)
    }

    /// Columns a model consumes: everything except target-like names.
    #[must_use]
    pub fn feature_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|column| {
                !TARGET_COLUMNS.iter().any(|target| column.eq_ignore_ascii_case(target))
            })
            .collect()
    }

    /// Feature columns pre-filled from the first row.
    ///
    /// Non-numeric cells and empty datasets yield `0.0`.
    #[must_use]
    pub fn sample_features(&self) -> BTreeMap<String, f64> {
        let first = self.rows.first();
        self.feature_columns()
            .into_iter()
            .map(|column| {
                let value = first
                    .and_then(|row| row.get(column))
                    .and_then(Scalar::as_number)
                    .unwrap_or(0.0);
                (column.to_string(), value)
            })
            .collect()
    }
}

impl Entity for Dataset {
    const COLLECTION: &'static str = "datasets";

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Fields supplied when a dataset is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDraft {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl DatasetDraft {
    pub fn validate(&self) -> Result<(), DatasetError> {
        validate_table(&self.name, &self.columns, &self.rows)
    }

    #[must_use]
    pub fn into_dataset(self, uploaded_at: DateTime<Utc>) -> Dataset {
        Dataset { id: 0, name: self.name, columns: self.columns, rows: self.rows, uploaded_at }
    }
}

/// Shallow merge: present fields overwrite, absent ones are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub rows: Option<Vec<Record>>,
}

impl DatasetPatch {
    pub fn apply(self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        if let Some(name) = self.name {
            dataset.name = name;
        }
        if let Some(columns) = self.columns {
            dataset.columns = columns;
        }
        if let Some(rows) = self.rows {
            dataset.rows = rows;
        }
        dataset.validate()
    }
}

fn validate_table(name: &str, columns: &[String], rows: &[Record]) -> Result<(), DatasetError> {
    if name.trim().is_empty() {
        return Err(DatasetError::EmptyName);
    }

    let mut expected = BTreeSet::new();
    for column in columns {
        if !expected.insert(column.as_str()) {
            return Err(DatasetError::DuplicateColumn(column.clone()));
        }
    }

    for (index, row) in rows.iter().enumerate() {
        if row.len() != expected.len() || !row.keys().all(|key| expected.contains(key.as_str())) {
            return Err(DatasetError::RowMismatch {
                row: index,
                found: row.keys().cloned().collect(),
            });
        }
    }
    Ok(())
}

/// Build a record from `(column, value)` pairs.
pub fn record<I, K, V>(cells: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Scalar>,
{
    cells.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// The fixed sample table seeded on `init`.
#[must_use]
pub fn sample_dataset_draft() -> DatasetDraft {
    let rows: [(f64, f64, f64, i32); 8] = [
        (1.2, 2.1, 0.8, 1),
        (2.1, 1.8, 1.2, 0),
        (0.9, 2.5, 0.6, 1),
        (1.8, 1.2, 1.5, 0),
        (2.3, 0.9, 1.8, 0),
        (0.7, 2.8, 0.4, 1),
        (1.6, 1.5, 1.1, 0),
        (2.0, 0.8, 1.9, 0),
    ];
    DatasetDraft {
        name: "sample_data.csv".to_string(),
        columns: ["feature1", "feature2", "feature3", "target"].map(String::from).to_vec(),
        rows: rows
            .iter()
            .map(|&(f1, f2, f3, target)| {
                record([
                    ("feature1", Scalar::from(f1)),
                    ("feature2", Scalar::from(f2)),
                    ("feature3", Scalar::from(f3)),
                    ("target", Scalar::from(target)),
                ])
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_column_draft() -> DatasetDraft {
        DatasetDraft {
            name: "iris.csv".into(),
            columns: vec!["a".into(), "b".into()],
            rows: vec![record([("a", 1), ("b", 2)])],
        }
    }

    #[test]
    fn test_shape_is_derived() {
        let dataset = two_column_draft().into_dataset(Utc::now());
        assert_eq!(dataset.shape(), Shape { row_count: 1, column_count: 2 });
    }

    #[test]
    fn test_validate_rejects_extra_and_missing_keys() {
        let mut draft = two_column_draft();
        draft.rows.push(record([("a", 3)]));
        assert_eq!(
            draft.validate(),
            Err(DatasetError::RowMismatch { row: 1, found: vec!["a".into()] })
        );

        let mut draft = two_column_draft();
        draft.rows.push(record([("a", 3), ("c", 4)]));
        assert!(matches!(draft.validate(), Err(DatasetError::RowMismatch { row: 1, .. })));
    }

    #[test]
    fn test_validate_rejects_duplicate_columns() {
        let draft = DatasetDraft {
            name: "dup.csv".into(),
            columns: vec!["a".into(), "a".into()],
            rows: vec![],
        };
        assert_eq!(draft.validate(), Err(DatasetError::DuplicateColumn("a".into())));
    }

    #[test]
    fn test_patch_is_shallow_merge() {
        let mut dataset = two_column_draft().into_dataset(Utc::now());
        let patch = DatasetPatch { name: Some("renamed.csv".into()), ..DatasetPatch::default() };
        patch.apply(&mut dataset).unwrap();
        assert_eq!(dataset.name, "renamed.csv");
        assert_eq!(dataset.columns, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_feature_columns_skip_targets() {
        let dataset = sample_dataset_draft().into_dataset(Utc::now());
        assert_eq!(dataset.feature_columns(), vec!["feature1", "feature2", "feature3"]);
        let sample = dataset.sample_features();
        assert_eq!(sample.get("feature1"), Some(&1.2));
        assert!(!sample.contains_key("target"));
    }

    #[test]
    fn test_sample_dataset_is_valid() {
        let draft = sample_dataset_draft();
        assert!(draft.validate().is_ok());
        assert_eq!(draft.rows.len(), 8);
    }

    #[test]
    fn test_scalar_serde_is_untagged() {
        let row: Record = serde_json::from_str(r#"{"a": 1.5, "b": "setosa"}"#).unwrap();
        assert_eq!(row["a"], Scalar::Number(1.5));
        assert_eq!(row["b"], Scalar::Text("setosa".into()));
    }
}
