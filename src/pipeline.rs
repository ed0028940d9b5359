use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::data::cleaner::{coerce_numeric, drop_empty_rows, normalize_columns, trim_strings};
use crate::data::exporter::{export_csv, export_excel};
use crate::data::filter::{filter_rows, RowFilter};
use crate::data::loader::load_file;
use crate::data::model::Dataset;
use crate::data::ranker::{add_rank, top_n};
use crate::data::sorter::{sort_dataset, NullPosition, SortOrder};

// ---------------------------------------------------------------------------
// Plan: the user's choices for one run
// ---------------------------------------------------------------------------

/// Ranking step of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RankPlan {
    pub score_column: String,
    pub higher_is_better: bool,
    /// Keep only this many rows after ranking; `None` keeps all of them.
    pub top_n: Option<usize>,
}

/// Everything a run does after loading and cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub filter: Option<RowFilter>,
    pub sort_columns: Vec<String>,
    pub order: SortOrder,
    pub rank: Option<RankPlan>,
    pub export_csv: bool,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub loaded_rows: usize,
    pub cleaned_rows: usize,
    pub filtered_rows: usize,
    pub final_rows: usize,
    pub columns: Vec<String>,
    pub outputs: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// The load → clean → filter → sort → rank → export chain.
///
/// Each stage takes a `&Dataset` and returns a new one; nothing is kept
/// between calls except the configuration.
pub struct Pipeline<'a> {
    config: &'a Config,
    nulls: NullPosition,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            nulls: config.null_position()?,
        })
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Load `path` and run the cleaning steps. Also returns the raw row count.
    pub fn load_and_clean(&self, path: &Path) -> Result<(Dataset, usize)> {
        let raw = load_file(path)?;
        let cleaned = self.clean(&raw);
        info!(
            "cleaned: {} rows x {} columns ({} loaded)",
            cleaned.len(),
            cleaned.width(),
            raw.len()
        );
        Ok((cleaned, raw.len()))
    }

    /// Normalize names, drop empty rows, trim text, then coerce the
    /// configured numeric columns.
    pub fn clean(&self, ds: &Dataset) -> Dataset {
        let ds = normalize_columns(ds);
        let ds = drop_empty_rows(&ds);
        let ds = trim_strings(&ds);
        coerce_numeric(&ds, &self.config.numeric_columns())
    }

    pub fn filter(&self, ds: &Dataset, filter: Option<&RowFilter>) -> Result<Dataset> {
        match filter {
            Some(f) => {
                let kept = filter_rows(ds, f)?;
                if kept.is_empty() && !ds.is_empty() {
                    warn!("no rows match {}='{}'", f.column, f.value);
                }
                Ok(kept)
            }
            None => Ok(ds.clone()),
        }
    }

    pub fn sort(&self, ds: &Dataset, columns: &[String], order: &SortOrder) -> Result<Dataset> {
        Ok(sort_dataset(ds, columns, order, self.nulls)?)
    }

    /// Rank, re-sort by rank (best first, unranked last) and truncate.
    ///
    /// The re-sort is stable, so rows tied on rank keep the order the
    /// previous sort gave them, and that order decides which tied rows
    /// survive a Top-N cut.
    pub fn rank(&self, ds: &Dataset, plan: &RankPlan) -> Result<Dataset> {
        let rank_column = &self.config.rank_column;
        let ranked = add_rank(ds, &plan.score_column, rank_column, plan.higher_is_better)?;
        let ordered = sort_dataset(
            &ranked,
            std::slice::from_ref(rank_column),
            &SortOrder::Uniform(true),
            NullPosition::Last,
        )?;
        match plan.top_n {
            Some(n) => Ok(top_n(&ordered, n)?),
            None => Ok(ordered),
        }
    }

    /// Write `<output_dir>/<stem>_<stamp>.xlsx`, plus a `.csv` twin on request.
    pub fn export(&self, ds: &Dataset, with_csv: bool, stamp: &str) -> Result<Vec<PathBuf>> {
        let base = self
            .config
            .output_dir
            .join(format!("{}_{stamp}", self.config.output_stem));
        let mut outputs = vec![export_excel(ds, &base.with_extension("xlsx"))?];
        if with_csv {
            outputs.push(export_csv(ds, &base.with_extension("csv"))?);
        }
        Ok(outputs)
    }

    /// Run a complete plan without any interaction.
    pub fn run(&self, input: &Path, plan: &RunPlan) -> Result<RunReport> {
        let (cleaned, loaded_rows) = self.load_and_clean(input)?;
        let filtered = self.filter(&cleaned, plan.filter.as_ref())?;
        let sorted = self.sort(&filtered, &plan.sort_columns, &plan.order)?;
        let finished = match &plan.rank {
            Some(rank) => self.rank(&sorted, rank)?,
            None => sorted,
        };
        let outputs = self.export(&finished, plan.export_csv, &timestamp())?;

        Ok(RunReport {
            input: input.to_path_buf(),
            loaded_rows,
            cleaned_rows: cleaned.len(),
            filtered_rows: filtered.len(),
            final_rows: finished.len(),
            columns: finished.columns.clone(),
            outputs,
        })
    }
}

/// Local time as `YYYYmmdd_HHMMSS`, used in output file names.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::error::PipelineError;

    const RESPONSES: &str = "\
Student Name,City,Score,Total Marks (%)
  Asha ,Pune,88,91
Ben,pune,95,
Chen,Delhi,88,77.5
,,,
Dev,PUNE,absent,60
Esha, Pune ,70,NaN
";

    fn config_in(dir: &Path) -> Config {
        Config {
            output_dir: dir.join("out"),
            ..Config::default()
        }
    }

    fn write_input(dir: &Path) -> PathBuf {
        let path = dir.join("responses.csv");
        std::fs::write(&path, RESPONSES).unwrap();
        path
    }

    fn names(ds: &Dataset) -> Vec<String> {
        ds.column_values("student_name")
            .unwrap()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn clean_normalizes_and_coerces() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let pipeline = Pipeline::new(&config).unwrap();

        let (ds, loaded) = pipeline.load_and_clean(&write_input(dir.path())).unwrap();
        assert_eq!(loaded, 6);
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.columns, vec!["student_name", "city", "score", "total_marks"]);
        assert_eq!(names(&ds), vec!["Asha", "Ben", "Chen", "Dev", "Esha"]);
        let scores: Vec<CellValue> = ds.column_values("score").unwrap().cloned().collect();
        assert_eq!(scores[0], CellValue::Integer(88));
        assert!(scores[3].is_null());
        assert_eq!(ds.rows[4][1], CellValue::from("Pune"));
    }

    #[test]
    fn batch_run_filters_ranks_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let pipeline = Pipeline::new(&config).unwrap();
        let plan = RunPlan {
            filter: Some(RowFilter::new("city", "pune")),
            sort_columns: vec!["student_name".into()],
            order: SortOrder::Uniform(false),
            rank: Some(RankPlan {
                score_column: "score".into(),
                higher_is_better: true,
                top_n: Some(2),
            }),
            export_csv: true,
        };

        let report = pipeline.run(&write_input(dir.path()), &plan).unwrap();
        assert_eq!(report.cleaned_rows, 5);
        assert_eq!(report.filtered_rows, 4);
        assert_eq!(report.final_rows, 2);
        assert_eq!(report.columns.last().map(String::as_str), Some("rank"));
        assert_eq!(report.outputs.len(), 2);
        assert!(report.outputs.iter().all(|p| p.exists()));

        let exported = load_file(&report.outputs[1]).unwrap();
        let top: Vec<String> = names(&exported);
        assert_eq!(top, vec!["Ben", "Asha"]);
    }

    #[test]
    fn rank_ties_at_the_cut_follow_previous_order() {
        let config = Config::default();
        let pipeline = Pipeline::new(&config).unwrap();
        let ds = Dataset::new(
            vec!["student_name".into(), "score".into()],
            vec![
                vec!["Zed".into(), CellValue::Integer(80)],
                vec!["Amy".into(), CellValue::Integer(90)],
                vec!["Kim".into(), CellValue::Integer(80)],
                vec!["Lee".into(), CellValue::Null],
            ],
        )
        .unwrap();
        let plan = RankPlan {
            score_column: "score".into(),
            higher_is_better: true,
            top_n: Some(2),
        };
        let out = pipeline.rank(&ds, &plan).unwrap();
        assert_eq!(names(&out), vec!["Amy", "Zed"]);

        let all = pipeline.rank(&ds, &RankPlan { top_n: None, ..plan }).unwrap();
        assert_eq!(names(&all), vec!["Amy", "Zed", "Kim", "Lee"]);
        assert!(all.rows[3][2].is_null());
    }

    #[test]
    fn per_column_directions_and_empty_filter_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let pipeline = Pipeline::new(&config).unwrap();
        let (ds, _) = pipeline.load_and_clean(&write_input(dir.path())).unwrap();

        let sorted = pipeline
            .sort(
                &ds,
                &["city".into(), "score".into()],
                &SortOrder::PerColumn(vec![true, false]),
            )
            .unwrap();
        assert_eq!(names(&sorted), vec!["Chen", "Dev", "Asha", "Esha", "Ben"]);

        let none = pipeline
            .filter(&ds, Some(&RowFilter::new("city", "Goa")))
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(none.columns, ds.columns);
    }

    #[test]
    fn sort_on_missing_column_reports_available_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let pipeline = Pipeline::new(&config).unwrap();
        let plan = RunPlan {
            filter: None,
            sort_columns: vec!["grade".into()],
            order: SortOrder::default(),
            rank: None,
            export_csv: false,
        };
        let err = pipeline.run(&write_input(dir.path()), &plan).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ColumnNotFound { .. })
        ));
        assert!(!dir.path().join("out").exists());
    }
}
