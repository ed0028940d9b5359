use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use encoding_rs::{UTF_8, WINDOWS_1252};
use log::{info, warn};

use super::model::{CellValue, Dataset};
use crate::error::PipelineError;

/// Extensions `load_file` accepts (compared lowercased, without the dot).
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["csv", "xlsx", "xls", "xlsm", "ods"];

/// Text that reads as a missing value in CSV files.
const NA_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` – comma separated, header row first; UTF-8 with a Windows-1252
///   fallback for files that are not valid UTF-8
/// * `.xlsx` / `.xls` / `.xlsm` / `.ods` – first worksheet, header row first
///
/// Missing files fail with [`PipelineError::NotFound`], other extensions with
/// [`PipelineError::UnsupportedFormat`].
pub fn load_file(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(PipelineError::NotFound(path.to_path_buf()).into());
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        e if SUPPORTED_EXTENSIONS.contains(&e) => load_spreadsheet(path),
        "" => Err(PipelineError::UnsupportedFormat("(no extension)".into()).into()),
        other => Err(PipelineError::UnsupportedFormat(format!(".{other}")).into()),
    }?;

    info!(
        "loaded {}: {} rows x {} columns",
        path.display(),
        dataset.len(),
        dataset.width()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path).context("reading CSV file")?;
    let text = decode_text(&bytes);
    parse_csv(&text)
}

/// Decode CSV bytes as UTF-8, falling back to Windows-1252 (a superset of
/// Latin-1) when the bytes are not valid UTF-8. A UTF-8 BOM is dropped.
fn decode_text(bytes: &[u8]) -> String {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text.into_owned();
    }
    warn!("CSV is not valid UTF-8, decoding as Windows-1252");
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

fn parse_csv(text: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.to_string()
            }
        })
        .collect();
    let width = headers.len();

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() > width {
            warn!(
                "CSV row {row_no}: {} fields for {width} columns, extra fields dropped",
                record.len()
            );
        }
        let row = (0..width)
            .map(|i| {
                record
                    .get(i)
                    .filter(|v| !NA_MARKERS.contains(v))
                    .map(str::to_string)
            })
            .collect();
        raw_rows.push(row);
    }

    let numeric: Vec<bool> = (0..width)
        .map(|i| {
            raw_rows
                .iter()
                .filter_map(|row| row[i].as_deref())
                .all(|v| !CellValue::parse_number(v).is_null())
        })
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&numeric)
                .map(|(cell, &is_numeric)| match cell {
                    None => CellValue::Null,
                    Some(v) if is_numeric => CellValue::parse_number(&v),
                    Some(v) => CellValue::Text(v),
                })
                .collect()
        })
        .collect();

    Ok(Dataset::new(dedupe_headers(headers), rows)?)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the first worksheet; its first row is the header.
fn load_spreadsheet(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening spreadsheet {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no worksheets")?
        .context("reading first worksheet")?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Dataset::new(Vec::new(), Vec::new())?);
    };

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| match spreadsheet_cell(cell) {
            CellValue::Null => format!("Unnamed: {i}"),
            other => other.to_string(),
        })
        .collect();
    let width = headers.len();

    let rows = sheet_rows
        .map(|row| {
            (0..width)
                .map(|i| row.get(i).map_or(CellValue::Null, spreadsheet_cell))
                .collect()
        })
        .collect();

    Ok(Dataset::new(dedupe_headers(headers), rows)?)
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::float(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        other => other
            .as_datetime()
            .map(|dt| CellValue::Text(dt.to_string()))
            .unwrap_or_else(|| CellValue::Text(other.to_string())),
    }
}

/// Make repeated header names unique by appending `.1`, `.2`, ...
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        let mut n = 1;
        while out.contains(&name) {
            name = format!("{header}.{n}");
            n += 1;
        }
        out.push(name);
    }
    out
}
