use std::cmp::Ordering;

use log::debug;

use super::cleaner::to_numeric;
use super::model::{CellValue, Dataset};
use crate::error::PipelineError;

/// Name of the rank column when the caller does not pick one.
pub const DEFAULT_RANK_COLUMN: &str = "rank";

/// Add a dense rank computed from `score_column`.
///
/// The score column is coerced to numbers first (unparseable cells become
/// null). Tied scores share a rank and the next distinct score gets the next
/// integer, so two distinct scores always produce ranks 1 and 2. Null scores
/// get a null rank. With `higher_is_better` the largest score is rank 1,
/// otherwise the smallest is.
///
/// The rank column is appended, or overwritten in place if it already exists.
/// Row order is unchanged.
pub fn add_rank(
    ds: &Dataset,
    score_column: &str,
    rank_column: &str,
    higher_is_better: bool,
) -> Result<Dataset, PipelineError> {
    let score_idx = ds.require_column(score_column)?;

    let coerced: Vec<CellValue> = ds
        .rows
        .iter()
        .map(|row| to_numeric(&row[score_idx]))
        .collect();

    // Best score first. Integer pairs compare exactly; floats treat -0.0 as 0.0.
    let better = |a: &CellValue, b: &CellValue| -> Ordering {
        let ord = a.numeric_cmp(b).unwrap_or(Ordering::Equal);
        if higher_is_better {
            ord.reverse()
        } else {
            ord
        }
    };

    let mut distinct: Vec<&CellValue> = coerced.iter().filter(|c| !c.is_null()).collect();
    distinct.sort_by(|a, b| better(*a, *b));
    distinct.dedup_by(|a, b| better(*a, *b).is_eq());
    debug!(
        "ranking {} rows on '{score_column}': {} distinct scores",
        ds.len(),
        distinct.len()
    );

    let rank_of = |score: &CellValue| -> CellValue {
        if score.is_null() {
            return CellValue::Null;
        }
        let pos = distinct.partition_point(|d| better(*d, score).is_lt());
        CellValue::Integer(pos as i64 + 1)
    };

    let mut columns = ds.columns.clone();
    let rank_idx = match ds.column_index(rank_column) {
        Some(idx) => idx,
        None => {
            columns.push(rank_column.to_string());
            columns.len() - 1
        }
    };

    let rows = ds
        .rows
        .iter()
        .zip(&coerced)
        .map(|(row, score)| {
            let mut row = row.clone();
            let rank = rank_of(score);
            row[score_idx] = score.clone();
            if rank_idx == row.len() {
                row.push(rank);
            } else {
                row[rank_idx] = rank;
            }
            row
        })
        .collect();

    Ok(Dataset { columns, rows })
}

/// First `n` rows, or every row when `n` exceeds the row count.
pub fn top_n(ds: &Dataset, n: usize) -> Result<Dataset, PipelineError> {
    if n == 0 {
        return Err(PipelineError::invalid("n must be > 0"));
    }
    Ok(ds.with_rows(ds.rows.iter().take(n).cloned().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: Vec<CellValue>) -> Dataset {
        Dataset::new(
            vec!["name".into(), "score".into()],
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| vec![CellValue::Text(format!("s{i}")), v])
                .collect(),
        )
        .unwrap()
    }

    fn ranks(ds: &Dataset) -> Vec<Option<i64>> {
        ds.column_values(DEFAULT_RANK_COLUMN)
            .unwrap()
            .map(|c| match c {
                CellValue::Integer(r) => Some(*r),
                CellValue::Null => None,
                other => panic!("unexpected rank {other:?}"),
            })
            .collect()
    }

    fn ints(vals: &[i64]) -> Vec<CellValue> {
        vals.iter().map(|&v| CellValue::Integer(v)).collect()
    }

    #[test]
    fn dense_rank_higher_is_better() {
        let ds = scores(ints(&[90, 80, 80, 70]));
        let out = add_rank(&ds, "score", DEFAULT_RANK_COLUMN, true).unwrap();
        assert_eq!(ranks(&out), vec![Some(1), Some(2), Some(2), Some(3)]);
    }

    #[test]
    fn dense_rank_lower_is_better() {
        let ds = scores(ints(&[90, 80, 80, 70]));
        let out = add_rank(&ds, "score", DEFAULT_RANK_COLUMN, false).unwrap();
        assert_eq!(ranks(&out), vec![Some(3), Some(2), Some(2), Some(1)]);
    }

    #[test]
    fn two_distinct_values_give_ranks_one_and_two() {
        let ds = scores(ints(&[5, 9, 9, 5, 9]));
        let out = add_rank(&ds, "score", DEFAULT_RANK_COLUMN, true).unwrap();
        assert_eq!(ranks(&out), vec![Some(2), Some(1), Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn non_numeric_scores_get_null_rank() {
        let ds = scores(vec![
            "88".into(),
            "absent".into(),
            CellValue::Null,
            CellValue::Float(88.0),
            CellValue::Float(91.5),
        ]);
        let out = add_rank(&ds, "score", DEFAULT_RANK_COLUMN, true).unwrap();
        assert_eq!(ranks(&out), vec![Some(2), None, None, Some(2), Some(1)]);
        // score column is numeric afterwards
        assert_eq!(out.rows[0][1], CellValue::Integer(88));
        assert!(out.rows[1][1].is_null());
        // row order unchanged
        assert_eq!(out.rows[4][0], CellValue::from("s4"));
    }

    #[test]
    fn existing_rank_column_is_overwritten_in_place() {
        let ds = Dataset::new(
            vec!["rank".into(), "score".into()],
            vec![
                vec!["old".into(), CellValue::Integer(1)],
                vec!["old".into(), CellValue::Integer(2)],
            ],
        )
        .unwrap();
        let out = add_rank(&ds, "score", "rank", true).unwrap();
        assert_eq!(out.columns, vec!["rank", "score"]);
        assert_eq!(out.rows[0][0], CellValue::Integer(2));
        assert_eq!(out.rows[1][0], CellValue::Integer(1));
    }

    #[test]
    fn custom_rank_column_is_appended() {
        let ds = scores(ints(&[3, 1]));
        let out = add_rank(&ds, "score", "position", false).unwrap();
        assert_eq!(out.columns, vec!["name", "score", "position"]);
        assert_eq!(out.rows[1][2], CellValue::Integer(1));
    }

    #[test]
    fn missing_score_column_is_an_error() {
        let ds = scores(ints(&[1]));
        let err = add_rank(&ds, "marks", DEFAULT_RANK_COLUMN, true).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound { .. }));
    }

    #[test]
    fn signed_zero_scores_share_a_rank() {
        let ds = scores(vec!["0.0".into(), "-0.0".into(), CellValue::Float(-0.0), "1".into()]);
        let out = add_rank(&ds, "score", DEFAULT_RANK_COLUMN, true).unwrap();
        assert_eq!(ranks(&out), vec![Some(2), Some(2), Some(2), Some(1)]);
    }

    #[test]
    fn integer_and_float_of_same_value_tie() {
        let ds = scores(vec![CellValue::Integer(80), CellValue::Float(80.0), CellValue::Integer(90)]);
        let out = add_rank(&ds, "score", DEFAULT_RANK_COLUMN, true).unwrap();
        assert_eq!(ranks(&out), vec![Some(2), Some(2), Some(1)]);
    }

    #[test]
    fn large_integer_scores_stay_distinct() {
        let ds = scores(ints(&[i64::MAX - 1, i64::MAX, i64::MAX - 1]));
        let out = add_rank(&ds, "score", DEFAULT_RANK_COLUMN, true).unwrap();
        assert_eq!(ranks(&out), vec![Some(2), Some(1), Some(2)]);

        let out = add_rank(&ds, "score", DEFAULT_RANK_COLUMN, false).unwrap();
        assert_eq!(ranks(&out), vec![Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn top_n_truncates_and_rejects_zero() {
        let ds = scores(ints(&[4, 3, 2, 1]));
        let out = top_n(&ds, 2).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows, ds.rows[..2].to_vec());

        assert!(matches!(top_n(&ds, 0), Err(PipelineError::InvalidArgument(_))));
    }

    #[test]
    fn top_n_beyond_length_returns_everything() {
        let ds = scores(ints(&[4, 3, 2]));
        assert_eq!(top_n(&ds, 3).unwrap(), ds);
        assert_eq!(top_n(&ds, 50).unwrap(), ds);
    }
}
