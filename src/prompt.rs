use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::data::filter::RowFilter;
use crate::data::model::Dataset;
use crate::data::sorter::SortOrder;
use crate::error::PipelineError;
use crate::pipeline::{timestamp, Pipeline, RankPlan, RunReport};

/// How many distinct values to show as a hint when asking for a filter value.
const FILTER_HINT_VALUES: usize = 10;

// ---------------------------------------------------------------------------
// Interactive session
// ---------------------------------------------------------------------------

/// Walk the user through one run: load, clean, filter, sort, rank, export.
///
/// `input` skips the path prompt when the file was given on the command line.
pub fn interactive_session(pipeline: &Pipeline<'_>, input: Option<&Path>) -> Result<RunReport> {
    let theme = ColorfulTheme::default();
    println!("\n=== Rusty Ranker: clean, sort and rank tabular data ===");

    let path = match input {
        Some(p) => p.to_path_buf(),
        None => ask_path(&theme, &pipeline.config().default_input)?,
    };
    let (cleaned, loaded_rows) = pipeline.load_and_clean(&path)?;
    println!(
        "\nLoaded data: {loaded_rows} rows × {} columns",
        cleaned.width()
    );
    println!("\nColumns normalized + basic cleaning done.");
    print_columns(&cleaned);

    let filter = ask_filter(&theme, &cleaned)?;
    let filtered = pipeline.filter(&cleaned, filter.as_ref())?;
    if filter.is_some() {
        println!("Filtered rows: {} (from {})", filtered.len(), cleaned.len());
    }

    let sort_columns = choose_columns(&theme, &filtered)?;
    let ascending = ask_yes_no(&theme, "Sort ascending? (No means descending)")?;
    let sorted = pipeline.sort(&filtered, &sort_columns, &SortOrder::Uniform(ascending))?;

    let preview_rows = pipeline.config().preview_rows;
    println!("\nSorted successfully. Preview (first {preview_rows} rows):");
    println!("{}", sorted.preview(preview_rows));

    let finished = match ask_rank(&theme, &sorted)? {
        Some(plan) => pipeline.rank(&sorted, &plan)?,
        None => sorted,
    };

    let with_csv = ask_yes_no(&theme, "Also export CSV?")?;
    let outputs = pipeline.export(&finished, with_csv, &timestamp())?;
    for out in &outputs {
        println!("Exported to: {}", out.display());
    }
    println!("\nDone.");

    Ok(RunReport {
        input: path,
        loaded_rows,
        cleaned_rows: cleaned.len(),
        filtered_rows: filtered.len(),
        final_rows: finished.len(),
        columns: finished.columns.clone(),
        outputs,
    })
}

// ---------------------------------------------------------------------------
// Individual prompts
// ---------------------------------------------------------------------------

fn ask_path(theme: &ColorfulTheme, default: &Path) -> Result<PathBuf> {
    let raw: String = Input::with_theme(theme)
        .with_prompt("Enter file path")
        .default(default.display().to_string())
        .interact_text()
        .context("reading file path")?;
    Ok(PathBuf::from(raw.trim()))
}

fn ask_yes_no(theme: &ColorfulTheme, prompt: &str) -> Result<bool> {
    Confirm::with_theme(theme)
        .with_prompt(prompt)
        .interact()
        .with_context(|| format!("reading answer to '{prompt}'"))
}

fn print_columns(ds: &Dataset) {
    println!("\nAvailable columns:");
    for (i, c) in ds.columns.iter().enumerate() {
        println!("  {:>2}. {c}", i + 1);
    }
    println!();
}

fn choose_single_column(theme: &ColorfulTheme, ds: &Dataset, title: &str) -> Result<String> {
    if ds.columns.is_empty() {
        return Err(PipelineError::invalid("Dataset has no columns.").into());
    }
    let idx = Select::with_theme(theme)
        .with_prompt(format!("{title} - choose a column"))
        .items(&ds.columns)
        .default(0)
        .interact()
        .with_context(|| format!("choosing {title} column"))?;
    Ok(ds.columns[idx].clone())
}

fn ask_filter(theme: &ColorfulTheme, ds: &Dataset) -> Result<Option<RowFilter>> {
    if !ask_yes_no(theme, "Do you want to filter rows by a column value?")? {
        return Ok(None);
    }
    let column = choose_single_column(theme, ds, "Filter")?;

    let distinct = ds.distinct_values(&column);
    let hint: Vec<String> = distinct
        .iter()
        .filter(|v| !v.is_null())
        .take(FILTER_HINT_VALUES)
        .map(|v| v.to_string())
        .collect();
    if !hint.is_empty() {
        let more = if distinct.len() > hint.len() { ", ..." } else { "" };
        println!("Values in '{column}': {}{more}", hint.join(", "));
    }

    let value: String = Input::with_theme(theme)
        .with_prompt(format!("Enter the value to match for '{column}' (case-insensitive)"))
        .allow_empty(true)
        .interact_text()
        .context("reading filter value")?;
    Ok(Some(RowFilter::new(column, value)))
}

fn choose_columns(theme: &ColorfulTheme, ds: &Dataset) -> Result<Vec<String>> {
    print_columns(ds);
    println!("Choose columns to sort by (comma-separated numbers). Example: 1,3");
    let raw: String = Input::with_theme(theme)
        .with_prompt("Your choice")
        .allow_empty(true)
        .interact_text()
        .context("reading sort columns")?;
    Ok(parse_column_selection(&raw, &ds.columns)?)
}

fn ask_rank(theme: &ColorfulTheme, ds: &Dataset) -> Result<Option<RankPlan>> {
    if !ask_yes_no(
        theme,
        "Do you want to add ranking (Top N) based on a score column?",
    )? {
        return Ok(None);
    }
    let score_column = choose_single_column(theme, ds, "Ranking score")?;
    let higher_is_better = ask_yes_no(theme, "Higher score is better?")?;

    let max = ds.len().max(1);
    let n: usize = Input::with_theme(theme)
        .with_prompt(format!("Enter N for Top N (1-{max})"))
        .validate_with(move |n: &usize| -> Result<(), String> {
            if (1..=max).contains(n) {
                Ok(())
            } else {
                Err(format!("Must be between 1 and {max}"))
            }
        })
        .interact_text()
        .context("reading N")?;

    Ok(Some(RankPlan {
        score_column,
        higher_is_better,
        top_n: Some(n),
    }))
}

/// Turn `"1, 3"` into column names, using 1-based positions.
pub fn parse_column_selection(raw: &str, columns: &[String]) -> Result<Vec<String>, PipelineError> {
    let mut chosen = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let idx: usize = part
            .parse()
            .map_err(|_| PipelineError::invalid("Invalid column index."))?;
        if idx < 1 || idx > columns.len() {
            return Err(PipelineError::invalid("Invalid column index."));
        }
        chosen.push(columns[idx - 1].clone());
    }
    if chosen.is_empty() {
        return Err(PipelineError::invalid("No columns selected."));
    }
    Ok(chosen)
}
