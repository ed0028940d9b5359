use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Format, Workbook};

use super::model::{CellValue, Dataset};
use crate::error::PipelineError;

/// Export to an `.xlsx` workbook with a single sheet.
///
/// The header row is bold; nulls are left as empty cells. Returns the path
/// actually written, which always ends in `.xlsx`.
pub fn export_excel(ds: &Dataset, output_path: &Path) -> Result<PathBuf> {
    let path = prepare_path(output_path, "xlsx")?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (c, name) in ds.columns.iter().enumerate() {
        sheet.write_string_with_format(0, sheet_col(c)?, name, &bold)?;
    }
    for (r, row) in ds.rows.iter().enumerate() {
        let r = u32::try_from(r + 1)
            .map_err(|_| PipelineError::invalid("Too many rows for a spreadsheet"))?;
        for (c, cell) in row.iter().enumerate() {
            let c = sheet_col(c)?;
            match cell {
                CellValue::Null => {}
                CellValue::Integer(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                CellValue::Float(v) => {
                    sheet.write_number(r, c, *v)?;
                }
                CellValue::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
            }
        }
    }

    workbook
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("exported {} rows to {}", ds.len(), path.display());
    Ok(path)
}

/// Export to a UTF-8 CSV file. Nulls become empty fields.
///
/// Returns the path actually written, which always ends in `.csv`.
pub fn export_csv(ds: &Dataset, output_path: &Path) -> Result<PathBuf> {
    let path = prepare_path(output_path, "csv")?;

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(&ds.columns).context("writing CSV header")?;
    for row in &ds.rows {
        writer
            .write_record(row.iter().map(|c| c.as_text().unwrap_or_default()))
            .context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;

    info!("exported {} rows to {}", ds.len(), path.display());
    Ok(path)
}

/// Swap in the canonical extension if needed and create parent directories.
fn prepare_path(output_path: &Path, extension: &str) -> Result<PathBuf> {
    let mut path = output_path.to_path_buf();
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if !matches {
        path.set_extension(extension);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(path)
}

fn sheet_col(c: usize) -> Result<u16> {
    Ok(u16::try_from(c).map_err(|_| PipelineError::invalid("Too many columns for a spreadsheet"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["name".into(), "score".into(), "note".into()],
            vec![
                vec!["Asha".into(), CellValue::Integer(90), "top, \"star\"".into()],
                vec!["Ben".into(), CellValue::Float(72.5), CellValue::Null],
                vec!["Chen".into(), CellValue::Null, "late".into()],
            ],
        )
        .unwrap()
    }

    fn assert_same_modulo_widening(a: &Dataset, b: &Dataset) {
        assert_eq!(a.columns, b.columns);
        assert_eq!(a.len(), b.len());
        for (ra, rb) in a.rows.iter().zip(&b.rows) {
            for (ca, cb) in ra.iter().zip(rb) {
                match (ca.as_f64(), cb.as_f64()) {
                    (Some(x), Some(y)) => assert_eq!(x, y),
                    _ => assert_eq!(ca, cb),
                }
            }
        }
    }

    #[test]
    fn csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_csv(&sample(), &dir.path().join("out.csv")).unwrap();
        let loaded = load_file(&written).unwrap();
        assert_same_modulo_widening(&sample(), &loaded);
    }

    #[test]
    fn excel_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_excel(&sample(), &dir.path().join("out.xlsx")).unwrap();
        let loaded = load_file(&written).unwrap();
        assert_same_modulo_widening(&sample(), &loaded);
    }

    #[test]
    fn canonical_extension_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_csv(&sample(), &dir.path().join("report.txt")).unwrap();
        assert_eq!(written, dir.path().join("report.csv"));
        assert!(written.exists());

        let written = export_excel(&sample(), &dir.path().join("report")).unwrap();
        assert_eq!(written, dir.path().join("report.xlsx"));

        let written = export_csv(&sample(), &dir.path().join("upper.CSV")).unwrap();
        assert_eq!(written, dir.path().join("upper.CSV"));
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("deeper").join("out.csv");
        let written = export_csv(&sample(), &target).unwrap();
        assert!(written.exists());
    }

    #[test]
    fn csv_has_no_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_csv(&sample(), &dir.path().join("out.csv")).unwrap();
        let text = std::fs::read_to_string(written).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("name,score,note"));
        assert_eq!(lines.next(), Some("Asha,90,\"top, \"\"star\"\"\""));
        assert_eq!(lines.next(), Some("Ben,72.5,"));
    }
}
