use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use log::debug;

use super::model::{CellValue, Dataset};
use crate::error::PipelineError;

/// Where null cells go, independent of sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPosition {
    First,
    #[default]
    Last,
}

impl FromStr for NullPosition {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(NullPosition::First),
            "last" => Ok(NullPosition::Last),
            other => Err(PipelineError::invalid(format!(
                "null position must be 'first' or 'last', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for NullPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullPosition::First => write!(f, "first"),
            NullPosition::Last => write!(f, "last"),
        }
    }
}

/// Sort direction: one flag for every key, or one flag per key.
/// `true` means ascending.
#[derive(Debug, Clone, PartialEq)]
pub enum SortOrder {
    Uniform(bool),
    PerColumn(Vec<bool>),
}

impl SortOrder {
    fn directions(&self, keys: usize) -> Result<Vec<bool>, PipelineError> {
        match self {
            SortOrder::Uniform(asc) => Ok(vec![*asc; keys]),
            SortOrder::PerColumn(flags) if flags.len() == keys => Ok(flags.clone()),
            SortOrder::PerColumn(flags) => Err(PipelineError::invalid(format!(
                "Got {} sort directions for {} sort columns",
                flags.len(),
                keys
            ))),
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Uniform(true)
    }
}

/// Compare two non-null cells. Numbers compare by value and sort before text.
fn compare_values(a: &CellValue, b: &CellValue) -> Ordering {
    a.numeric_cmp(b).unwrap_or_else(|| a.cmp(b))
}

/// Stable multi-key sort. The first key is primary; later keys only break ties.
///
/// Every key must exist, otherwise a `ColumnNotFound` error names the
/// available columns. The input is never modified.
pub fn sort_dataset(
    ds: &Dataset,
    columns: &[String],
    order: &SortOrder,
    nulls: NullPosition,
) -> Result<Dataset, PipelineError> {
    if columns.is_empty() {
        return Err(PipelineError::invalid("No columns selected."));
    }
    let keys: Vec<usize> = columns
        .iter()
        .map(|c| ds.require_column(c))
        .collect::<Result<_, _>>()?;
    let directions = order.directions(keys.len())?;

    debug!("sorting {} rows by {columns:?} ({directions:?}, nulls {nulls})", ds.len());

    let mut rows = ds.rows.clone();
    // `sort_by` is a stable merge sort.
    rows.sort_by(|ra, rb| {
        for (&idx, &ascending) in keys.iter().zip(&directions) {
            let (a, b) = (&ra[idx], &rb[idx]);
            let ord = match (a.is_null(), b.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => match nulls {
                    NullPosition::First => Ordering::Less,
                    NullPosition::Last => Ordering::Greater,
                },
                (false, true) => match nulls {
                    NullPosition::First => Ordering::Greater,
                    NullPosition::Last => Ordering::Less,
                },
                (false, false) => {
                    let ord = compare_values(a, b);
                    if ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    Ok(ds.with_rows(rows))
}
