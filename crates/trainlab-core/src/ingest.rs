//! Turning uploaded files into dataset drafts.

use crate::error::{Result, WorkbenchError};
use crate::models::{DatasetDraft, Record, Scalar};
use async_trait::async_trait;
use csv::{ErrorKind as CsvErrorKind, ReaderBuilder, Trim};

/// Parses raw upload bytes into a draft the dataset store can accept.
#[async_trait]
pub trait Ingestor: Send + Sync {
    /// Whether this ingestor handles files called `name`.
    fn accepts(&self, name: &str) -> bool;

    async fn parse(&self, name: &str, bytes: &[u8]) -> Result<DatasetDraft>;
}

/// Comma-separated values with a header row.
///
/// Cells that parse as numbers become numbers; everything else stays text.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvIngestor;

#[async_trait]
impl Ingestor for CsvIngestor {
    fn accepts(&self, name: &str) -> bool {
        std::path::Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    }

    async fn parse(&self, name: &str, bytes: &[u8]) -> Result<DatasetDraft> {
        if !self.accepts(name) {
            return Err(WorkbenchError::UnsupportedFormat(format!("{name}: expected a .csv file")));
        }

        let mut reader = ReaderBuilder::new().has_headers(true).trim(Trim::All).from_reader(bytes);
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(name, e))?
            .iter()
            .map(str::to_string)
            .collect();
        if columns.is_empty() {
            return Err(WorkbenchError::UnsupportedFormat(format!("{name}: missing header row")));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| csv_error(name, e))?;
            let row: Record = columns
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.clone(), parse_cell(cell)))
                .collect();
            rows.push(row);
        }

        let draft = DatasetDraft { name: name.to_string(), columns, rows };
        draft.validate()?;
        Ok(draft)
    }
}

fn parse_cell(cell: &str) -> Scalar {
    cell.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map_or_else(|| Scalar::Text(cell.to_string()), Scalar::Number)
}

fn csv_error(name: &str, err: csv::Error) -> WorkbenchError {
    match err.kind() {
        CsvErrorKind::UnequalLengths { pos, expected_len, len } => {
            let line = pos.as_ref().map_or(0, csv::Position::line);
            WorkbenchError::InvalidInput(format!(
                "{name}: line {line} has {len} fields, expected {expected_len}"
            ))
        }
        _ => WorkbenchError::UnsupportedFormat(format!("{name}: {err}")),
    }
}
