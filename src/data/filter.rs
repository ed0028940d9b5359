use log::debug;

use super::model::{CellValue, Dataset};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Row filter: keep rows whose cell in one column equals a value
// ---------------------------------------------------------------------------

/// Case-insensitive exact match on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        RowFilter {
            column: column.into(),
            value: value.into(),
        }
    }

    fn needle(&self) -> String {
        self.value.trim().to_lowercase()
    }
}

/// Whether a cell passes the filter. Null cells never match.
fn cell_matches(cell: &CellValue, needle: &str) -> bool {
    cell.as_text()
        .is_some_and(|text| text.to_lowercase() == needle)
}

/// Return positions of rows that pass the filter.
pub fn matching_indices(ds: &Dataset, filter: &RowFilter) -> Result<Vec<usize>, PipelineError> {
    let idx = ds.require_column(&filter.column)?;
    let needle = filter.needle();
    Ok(ds
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| cell_matches(&row[idx], &needle))
        .map(|(i, _)| i)
        .collect())
}

/// Keep only the rows that pass the filter, in their original order.
pub fn filter_rows(ds: &Dataset, filter: &RowFilter) -> Result<Dataset, PipelineError> {
    let keep = matching_indices(ds, filter)?;
    debug!(
        "filter {}={:?} kept {} of {} rows",
        filter.column,
        filter.value,
        keep.len(),
        ds.len()
    );
    let rows = keep.into_iter().map(|i| ds.rows[i].clone()).collect();
    Ok(ds.with_rows(rows))
}
