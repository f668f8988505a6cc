//! Batch driver: maps a list of operations, one row at a time, in input order.

use futures::StreamExt;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, instrument, warn};

use brickmapper_shared::{RowResult, RowStatus};

use crate::processor::RowProcessor;

/// One operation to map, as exported from the test-case sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRow {
    #[serde(rename = "Operation ID", default, deserialize_with = "id_text")]
    pub operation_id: String,
    #[serde(rename = "Operation description", alias = "description")]
    pub description: String,
}

/// An input row together with its mapping result, ready for tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedRow {
    #[serde(rename = "Operation ID")]
    pub operation_id: String,
    #[serde(rename = "Operation Description")]
    pub operation_description: String,
    #[serde(flatten)]
    pub result: RowResult,
}

/// Row counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub matched: usize,
    pub no_match: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn of(rows: &[MappedRow]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, row| {
            match row.result.status() {
                RowStatus::Matched => acc.matched += 1,
                RowStatus::NoMatch => acc.no_match += 1,
                RowStatus::Error => acc.errors += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.matched + self.no_match + self.errors
    }
}

/// Progress callback for batch runs.
pub trait BatchProgress: Send + Sync {
    /// Called before a row is processed. `current` is 1-based.
    fn row_started(&self, current: usize, total: usize, description: &str);
    /// Called once every row has been processed.
    fn done(&self, summary: &BatchSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentBatchProgress;

impl BatchProgress for SilentBatchProgress {
    fn row_started(&self, _current: usize, _total: usize, _description: &str) {}
    fn done(&self, _summary: &BatchSummary) {}
}

/// Map every row strictly sequentially and return the results in input order.
///
/// Rows with a blank description are skipped. A failing row yields an ERROR
/// record and never stops the batch.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn run_batch(
    processor: &RowProcessor,
    rows: &[OperationRow],
    progress: &dyn BatchProgress,
) -> Vec<MappedRow> {
    let runnable: Vec<&OperationRow> = rows
        .iter()
        .filter(|row| {
            let keep = !row.description.trim().is_empty();
            if !keep {
                warn!(operation_id = %row.operation_id, "skipping row with empty description");
            }
            keep
        })
        .collect();
    let total = runnable.len();

    let mapped: Vec<MappedRow> = futures::stream::iter(runnable.into_iter().enumerate())
        .then(|(index, row)| async move {
            progress.row_started(index + 1, total, &row.description);
            let result = processor.process_row(Some(index), &row.description).await;
            MappedRow {
                operation_id: row.operation_id.clone(),
                operation_description: row.description.clone(),
                result,
            }
        })
        .collect()
        .await;

    let summary = BatchSummary::of(&mapped);
    info!(
        matched = summary.matched,
        no_match = summary.no_match,
        errors = summary.errors,
        "batch complete"
    );
    progress.done(&summary);

    mapped
}

fn id_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
