use serde::Serialize;
use tracing::{instrument, warn};

use crate::table::IntervalTable;

use super::{interval_statistics, IntervalStatistics};

/// Overall outcome of a multi-attribute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Partial,
}

/// Per-column statistics plus the columns that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStatistics {
    pub status: BatchStatus,
    /// Successful columns in request order.
    pub statistics: Vec<IntervalStatistics>,
    pub errors: Vec<String>,
}

impl BatchStatistics {
    /// Looks up the statistics of one column.
    pub fn get(&self, column: &str) -> Option<&IntervalStatistics> {
        self.statistics.iter().find(|s| s.column == column)
    }
}

/// Computes [`interval_statistics`] for each column independently.
///
/// A failing column adds a message to `errors` and does not stop the rest.
#[instrument(skip(table), fields(rows = table.num_rows()))]
pub fn multi_attribute_statistics<S: AsRef<str> + std::fmt::Debug>(
    table: &IntervalTable,
    columns: &[S],
) -> BatchStatistics {
    let mut statistics = Vec::with_capacity(columns.len());
    let mut errors = Vec::new();

    for column in columns {
        let column = column.as_ref();
        match interval_statistics(table, column) {
            Ok(stats) => statistics.push(stats),
            Err(e) => {
                warn!(column, error = %e, "Column statistics failed");
                errors.push(format!("{column}: {e}"));
            }
        }
    }

    BatchStatistics {
        status: if errors.is_empty() {
            BatchStatus::Success
        } else {
            BatchStatus::Partial
        },
        statistics,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_support::table;

    #[test]
    fn test_missing_column_makes_partial() {
        let t = table(
            &["DH1", "DH1"],
            &[0.0, 1.0],
            &[1.0, 2.0],
            &[("Au", vec![Some(1.0), Some(3.0)]), ("Cu", vec![None, None])],
        );

        let result = multi_attribute_statistics(&t, &["Au", "Ag", "Cu"]);
        assert_eq!(result.status, BatchStatus::Partial);
        assert_eq!(result.statistics.len(), 1);
        assert_eq!(result.get("Au").unwrap().length_weighted_mean, 2.0);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].starts_with("Ag:"));
        assert!(result.errors[1].contains("No valid data"));
    }

    #[test]
    fn test_all_columns_succeed() {
        let t = table(&["DH1"], &[0.0], &[1.0], &[("Au", vec![Some(1.0)])]);
        let result = multi_attribute_statistics(&t, &["Au".to_string()]);
        assert_eq!(result.status, BatchStatus::Success);
        assert!(result.errors.is_empty());
    }
}
