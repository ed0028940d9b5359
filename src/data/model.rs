use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a dataset
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
///
/// `Float` never holds NaN: anything that would be NaN is stored as `Null`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --
//
// Null < numbers < text. Integers and floats compare by value; when the
// values are equal the integer sorts first so the order stays total.

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Integer(_) | Float(_) => 1,
                Text(_) => 2,
            }
        }
        let ra = rank(self);
        let rb = rank(other);
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Integer(_), Float(_)) => self.numeric_order(other).then(Ordering::Less),
            (Float(_), Integer(_)) => self.numeric_order(other).then(Ordering::Greater),
            (Integer(_) | Float(_), _) => self.numeric_order(other),
            (Text(a), Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "<null>"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::float(v)
    }
}

impl CellValue {
    /// Build a float cell, mapping NaN to `Null` and `-0.0` to `0.0`.
    pub fn float(v: f64) -> Self {
        if v.is_nan() {
            CellValue::Null
        } else {
            CellValue::Float(v + 0.0)
        }
    }

    /// Compare two numeric cells by value, or `None` if either is not a number.
    ///
    /// Two integers compare exactly, so values above 2^53 stay distinct. Any
    /// pair involving a float compares as `f64`, where `-0.0 == 0.0`.
    pub fn numeric_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => Some(a.cmp(b)),
            _ => {
                let (a, b) = (self.as_f64()?, other.as_f64()?);
                // NaN never reaches a cell, see `float`.
                Some(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
            }
        }
    }

    fn numeric_order(&self, other: &Self) -> Ordering {
        self.numeric_cmp(other).unwrap_or(Ordering::Equal)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    /// Numeric view of the cell. Text is *not* parsed here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text rendering of a non-null cell, as written to CSV or matched by filters.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Parse a piece of text as a number.
    ///
    /// Surrounding whitespace is ignored. Integers stay integers; anything
    /// else that `f64` accepts becomes a float. Returns `Null` when the text
    /// is not a number (or is NaN).
    pub fn parse_number(s: &str) -> CellValue {
        let s = s.trim();
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        match s.parse::<f64>() {
            Ok(v) => CellValue::float(v),
            Err(_) => CellValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – ordered columns and rows of cells
// ---------------------------------------------------------------------------

/// An in-memory table.
///
/// Each row holds exactly one cell per entry in `columns`, in the same order.
/// Row positions double as the row index, so every transform that builds a
/// fresh `rows` vector is contiguously indexed from 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Column names, unique and in source order.
    pub columns: Vec<String>,
    /// Row-major cells.
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset, checking names are unique and rows are rectangular.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, PipelineError> {
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(PipelineError::invalid(format!(
                    "Duplicate column name '{col}'"
                )));
            }
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(PipelineError::invalid(format!(
                "Row {i} has {} cells but there are {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Dataset { columns, rows })
    }

    /// Same columns, different rows.
    pub fn with_rows(&self, rows: Vec<Vec<CellValue>>) -> Self {
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `name`, or a `ColumnNotFound` error listing what exists.
    pub fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::column_not_found(name, &self.columns))
    }

    /// Iterate over one column's cells, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Sorted set of the distinct values of a column.
    pub fn distinct_values(&self, name: &str) -> BTreeSet<CellValue> {
        self.column_values(name)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default()
    }

    /// Render the first `n` rows as an aligned text table.
    pub fn preview(&self, n: usize) -> String {
        let shown: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(n)
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                shown
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(shown.len() + 1);
        lines.push(render_line(&self.columns, &widths));
        for row in &shown {
            lines.push(render_line(row, &widths));
        }
        lines.join("\n")
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
