use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::table::IntervalTable;

use super::{mean, round_to, std_dev};

/// Row accounting for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
}

/// Length-weighted statistics of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalStatistics {
    pub column: String,
    /// `accumulation / total_length`, or 0 when the total length is 0.
    pub length_weighted_mean: f64,
    /// Sum of `grade * length`.
    pub accumulation: f64,
    pub total_length: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub count: usize,
    /// Missing or non-numeric values before masking.
    pub null_count: usize,
    pub data_quality: DataQuality,
}

impl IntervalStatistics {
    /// Returns a copy with every float rounded to `places` decimals.
    pub fn rounded(&self, places: i32) -> Self {
        Self {
            column: self.column.clone(),
            length_weighted_mean: round_to(self.length_weighted_mean, places),
            accumulation: round_to(self.accumulation, places),
            total_length: round_to(self.total_length, places),
            min: round_to(self.min, places),
            max: round_to(self.max, places),
            mean: round_to(self.mean, places),
            std: self.std.map(|s| round_to(s, places)),
            ..*self
        }
    }
}

/// Computes length-weighted statistics for `column`.
///
/// Fails if the column is absent or if no row is valid.
#[instrument(skip(table), fields(rows = table.num_rows()))]
pub fn interval_statistics(table: &IntervalTable, column: &str) -> Result<IntervalStatistics> {
    let valid = table
        .valid_intervals(column)?
        .require_rows(&format!("No valid data for column '{column}'"))?;

    let accumulation: f64 = valid
        .grades
        .iter()
        .zip(&valid.lengths)
        .map(|(grade, length)| grade * length)
        .sum();
    let total_length: f64 = valid.lengths.iter().sum();
    let length_weighted_mean = if total_length > 0.0 {
        accumulation / total_length
    } else {
        0.0
    };

    let (min, max) = valid
        .grades
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &g| {
            (lo.min(g), hi.max(g))
        });

    Ok(IntervalStatistics {
        column: column.to_string(),
        length_weighted_mean,
        accumulation,
        total_length,
        min,
        max,
        mean: mean(&valid.grades).unwrap_or_default(),
        std: std_dev(&valid.grades, 1),
        count: valid.len(),
        null_count: valid.null_count,
        data_quality: DataQuality {
            total_rows: valid.total_rows,
            valid_rows: valid.len(),
            invalid_rows: valid.total_rows - valid.len(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DownholeError;
    use crate::table::test_support::table;

    #[test]
    fn test_weighted_mean_accumulation_and_length() {
        let t = table(
            &["DH1", "DH1", "DH1"],
            &[0.0, 1.0, 2.0],
            &[1.0, 2.0, 4.0],
            &[("Au", vec![Some(1.0), Some(2.0), Some(3.0)])],
        );
        let stats = interval_statistics(&t, "Au").unwrap();
        assert_eq!(stats.length_weighted_mean, 2.25);
        assert_eq!(stats.accumulation, 9.0);
        assert_eq!(stats.total_length, 4.0);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.std, Some(1.0));
        assert_eq!((stats.min, stats.max), (1.0, 3.0));
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_invalid_rows_are_counted() {
        let t = table(
            &["DH1", "DH1", "DH1", "DH1"],
            &[0.0, 1.0, 2.0, 3.0],
            &[1.0, 1.0, 3.0, 4.0],
            &[("Au", vec![Some(4.0), Some(5.0), None, Some(2.0)])],
        );
        let stats = interval_statistics(&t, "Au").unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.std, Some(2f64.sqrt()));
        assert_eq!(
            stats.data_quality,
            DataQuality {
                total_rows: 4,
                valid_rows: 2,
                invalid_rows: 2
            }
        );
    }

    #[test]
    fn test_single_valid_row_has_no_std() {
        let t = table(&["DH1"], &[0.0], &[2.0], &[("Au", vec![Some(1.0)])]);
        assert_eq!(interval_statistics(&t, "Au").unwrap().std, None);
    }

    #[test]
    fn test_empty_and_missing_columns_fail_differently() {
        let t = table(&["DH1"], &[0.0], &[1.0], &[("Au", vec![None])]);
        assert!(matches!(
            interval_statistics(&t, "Au"),
            Err(DownholeError::EmptyResult(_))
        ));
        assert!(matches!(
            interval_statistics(&t, "Cu"),
            Err(DownholeError::NotFound { .. })
        ));
    }
}
