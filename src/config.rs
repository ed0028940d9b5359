use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::ranker::DEFAULT_RANK_COLUMN;
use crate::data::sorter::NullPosition;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Settings shared by every run. Loaded from a JSON file when one is given;
/// keys that are absent take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input offered when the user just presses Enter.
    pub default_input: PathBuf,
    /// Directory that receives the exported files.
    pub output_dir: PathBuf,
    /// File name prefix; a `_YYYYmmdd_HHMMSS` timestamp is appended.
    pub output_stem: String,
    /// Columns coerced to numbers during cleaning, when present.
    pub numeric_columns: Vec<String>,
    /// Name of the column the ranker writes.
    pub rank_column: String,
    /// `"first"` or `"last"`.
    pub null_position: String,
    /// Rows shown after sorting.
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_input: PathBuf::from("data/responses.xlsx"),
            output_dir: PathBuf::from("output"),
            output_stem: "results".to_string(),
            numeric_columns: ["score", "marks", "cgpa", "percentage"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rank_column: DEFAULT_RANK_COLUMN.to_string(),
            null_position: NullPosition::default().to_string(),
            preview_rows: 8,
        }
    }
}

impl Config {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.null_position()?;
        Ok(config)
    }

    pub fn null_position(&self) -> Result<NullPosition> {
        Ok(self.null_position.parse()?)
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.numeric_columns.iter().map(String::as_str).collect()
    }
}
