use std::collections::BTreeSet;

use log::debug;

use super::model::{CellValue, Dataset};

/// Text values that `trim_strings` treats as missing (compared lowercased).
const BLANK_LIKE: [&str; 4] = ["", "nan", "none", "null"];

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Normalize a raw header: lowercase, trim, squash every run of characters
/// outside `[a-z0-9]` into one `_`, then strip `_` from both ends.
///
/// `"Total Marks (%)"` becomes `"total_marks"`.
pub fn normalize_column_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Rename every column with [`normalize_column_name`].
///
/// Names that normalize to nothing become `column_<position>`; names that
/// collide with an earlier one get `_2`, `_3`, ... so they stay unique.
pub fn normalize_columns(ds: &Dataset) -> Dataset {
    let mut taken: BTreeSet<String> = BTreeSet::new();
    let mut columns = Vec::with_capacity(ds.width());

    for (i, raw) in ds.columns.iter().enumerate() {
        let mut name = normalize_column_name(raw);
        if name.is_empty() {
            name = format!("column_{}", i + 1);
        }
        if taken.contains(&name) {
            let base = name.clone();
            let mut n = 2;
            while taken.contains(&name) {
                name = format!("{base}_{n}");
                n += 1;
            }
        }
        if &name != raw {
            debug!("renamed column '{raw}' -> '{name}'");
        }
        taken.insert(name.clone());
        columns.push(name);
    }

    Dataset {
        columns,
        rows: ds.rows.clone(),
    }
}

// ---------------------------------------------------------------------------
// Cell clean-up
// ---------------------------------------------------------------------------

/// Parse the named columns as numbers. Cells that do not parse become null;
/// names that are not in the dataset are skipped.
pub fn coerce_numeric(ds: &Dataset, columns: &[&str]) -> Dataset {
    let targets: Vec<usize> = columns
        .iter()
        .filter_map(|name| ds.column_index(name))
        .collect();
    if targets.is_empty() {
        return ds.clone();
    }
    debug!("coercing {} column(s) to numeric", targets.len());

    let rows = ds
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            for &idx in &targets {
                row[idx] = to_numeric(&row[idx]);
            }
            row
        })
        .collect();
    ds.with_rows(rows)
}

pub(crate) fn to_numeric(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Text(s) => CellValue::parse_number(s),
        other => other.clone(),
    }
}

/// Remove rows in which every cell is null.
pub fn drop_empty_rows(ds: &Dataset) -> Dataset {
    let rows: Vec<Vec<CellValue>> = ds
        .rows
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_null()))
        .cloned()
        .collect();
    if rows.len() != ds.len() {
        debug!("dropped {} empty row(s)", ds.len() - rows.len());
    }
    ds.with_rows(rows)
}

/// Trim whitespace in text columns and turn blank-like text into null.
///
/// A column counts as text when it holds at least one text cell. Every
/// non-null cell of such a column is rendered as text before trimming, so
/// stray numbers in a mostly-text column come out as text too.
pub fn trim_strings(ds: &Dataset) -> Dataset {
    let text_columns: Vec<usize> = (0..ds.width())
        .filter(|&idx| ds.rows.iter().any(|row| row[idx].is_text()))
        .collect();

    let rows = ds
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            for &idx in &text_columns {
                row[idx] = trim_cell(&row[idx]);
            }
            row
        })
        .collect();
    ds.with_rows(rows)
}

fn trim_cell(cell: &CellValue) -> CellValue {
    let Some(text) = cell.as_text() else {
        return CellValue::Null;
    };
    let trimmed = text.trim();
    if BLANK_LIKE.contains(&trimmed.to_lowercase().as_str()) {
        CellValue::Null
    } else {
        CellValue::Text(trimmed.to_string())
    }
}
