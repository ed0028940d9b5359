use std::path::PathBuf;

use thiserror::Error;

/// Failures that end a run.
///
/// The data modules return these directly. The file-facing layers wrap them
/// in `anyhow::Error`, so callers can still recover the kind with
/// `downcast_ref::<PipelineError>()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file type: {0}. Use CSV or Excel.")]
    UnsupportedFormat(String),

    #[error("Column '{column}' not found. Available: {}", format_columns(.available))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("{0}")]
    InvalidArgument(String),
}

impl PipelineError {
    pub fn column_not_found(column: &str, available: &[String]) -> Self {
        PipelineError::ColumnNotFound {
            column: column.to_string(),
            available: available.to_vec(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        PipelineError::InvalidArgument(msg.into())
    }
}

fn format_columns(columns: &[String]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| format!("'{c}'")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_not_found_lists_available_columns() {
        let err = PipelineError::column_not_found(
            "grade",
            &["name".to_string(), "score".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Column 'grade' not found. Available: ['name', 'score']"
        );
    }

    #[test]
    fn unsupported_format_names_the_extension() {
        let err = PipelineError::UnsupportedFormat(".txt".into());
        assert!(err.to_string().contains(".txt"));
    }
}
