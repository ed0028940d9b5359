use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::data::filter::RowFilter;
use crate::data::sorter::{NullPosition, SortOrder};
use crate::error::PipelineError;
use crate::pipeline::{RankPlan, RunPlan};

/// Clean, filter, sort and rank a CSV or spreadsheet file.
///
/// Without `--sort` the tool asks for every choice interactively. With
/// `--sort` it runs straight through using the flags. Column names given
/// on the command line are the cleaned names (lowercase, `_`-separated).
/// The filter, ranking and CSV flags only apply to such a run, so they
/// require `--sort`.
#[derive(Debug, Parser)]
#[command(name = "rusty-ranker", version, about)]
pub struct Cli {
    /// Input file (.csv, .xlsx, .xls, .xlsm, .ods)
    pub input: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for exported files (overrides the config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Keep rows where COLUMN equals VALUE, ignoring case
    #[arg(long, value_name = "COLUMN=VALUE", value_parser = parse_filter, requires = "sort")]
    pub filter: Option<RowFilter>,

    /// Sort columns, primary first; repeat or separate with commas.
    /// Append `:asc` or `:desc` to set one column's direction
    #[arg(long, value_name = "COLUMN[:asc|:desc]", value_delimiter = ',')]
    pub sort: Vec<String>,

    /// Sort descending instead of ascending (columns without a suffix)
    #[arg(long)]
    pub descending: bool,

    /// Where empty values go when sorting: first or last
    #[arg(long, value_name = "first|last")]
    pub nulls: Option<NullPosition>,

    /// Add a dense rank computed from this score column
    #[arg(long, value_name = "COLUMN", requires = "sort")]
    pub rank_by: Option<String>,

    /// Give rank 1 to the lowest score instead of the highest
    #[arg(long, requires = "rank_by")]
    pub lower_is_better: bool,

    /// Keep only the best N rows after ranking
    #[arg(long, value_name = "N", requires = "sort")]
    pub top: Option<usize>,

    /// Also write a CSV next to the spreadsheet
    #[arg(long, requires = "sort")]
    pub csv: bool,

    /// Print a JSON summary of the run
    #[arg(long)]
    pub report_json: bool,
}

fn parse_filter(s: &str) -> Result<RowFilter, String> {
    match s.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok(RowFilter::new(column.trim(), value))
        }
        _ => Err(format!("expected COLUMN=VALUE, got '{s}'")),
    }
}

/// Split `score:desc` into the column and its direction (`true` = ascending).
/// A suffix other than `asc`/`desc` is part of the column name.
fn split_direction(key: &str) -> (&str, Option<bool>) {
    match key.rsplit_once(':') {
        Some((column, dir)) if dir.eq_ignore_ascii_case("asc") => (column.trim(), Some(true)),
        Some((column, dir)) if dir.eq_ignore_ascii_case("desc") => (column.trim(), Some(false)),
        _ => (key.trim(), None),
    }
}

/// Exit status for an argument error. `--help` and `--version` also arrive
/// as errors from clap but are successful runs.
pub fn usage_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

impl Cli {
    /// Fold command-line overrides into the config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(nulls) = self.nulls {
            config.null_position = nulls.to_string();
        }
    }

    /// The non-interactive plan, or `None` when no sort columns were given.
    pub fn batch_plan(&self) -> Result<Option<RunPlan>, PipelineError> {
        if self.sort.is_empty() {
            return Ok(None);
        }
        if self.top == Some(0) {
            return Err(PipelineError::invalid("n must be > 0"));
        }
        let rank = match (&self.rank_by, self.top) {
            (Some(column), top_n) => Some(RankPlan {
                score_column: column.clone(),
                higher_is_better: !self.lower_is_better,
                top_n,
            }),
            (None, Some(_)) => {
                return Err(PipelineError::invalid("--top needs --rank-by"));
            }
            (None, None) => None,
        };
        let keys: Vec<(&str, Option<bool>)> =
            self.sort.iter().map(|k| split_direction(k)).collect();
        let ascending = !self.descending;
        let order = if keys.iter().any(|(_, dir)| dir.is_some()) {
            SortOrder::PerColumn(keys.iter().map(|(_, dir)| dir.unwrap_or(ascending)).collect())
        } else {
            SortOrder::Uniform(ascending)
        };
        Ok(Some(RunPlan {
            filter: self.filter.clone(),
            sort_columns: keys.iter().map(|(column, _)| column.to_string()).collect(),
            order,
            rank,
            export_csv: self.csv,
        }))
    }
}
