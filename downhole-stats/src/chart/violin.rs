use std::collections::BTreeMap;

use serde::Serialize;
use tracing::instrument;

use crate::error::{DownholeError, Result};
use crate::stats::{mean, percentile, std_dev};
use crate::table::IntervalTable;

use super::{ChartDescription, ChartLayout, ChartSeries, DistributionSeries};

/// Summary statistics of an ungrouped distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    pub q1: f64,
    pub q3: f64,
}

impl DistributionSummary {
    fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            mean: mean(values)?,
            median: percentile(&sorted, 0.5)?,
            std: std_dev(values, 0)?,
            q1: percentile(&sorted, 0.25)?,
            q3: percentile(&sorted, 0.75)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolinMetadata {
    pub column: String,
    pub group_by: Option<String>,
    pub group_count: usize,
    pub total_samples: usize,
    /// Present only for ungrouped charts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DistributionSummary>,
}

/// Builds distribution series for the valid rows of `column`.
///
/// With `group_by`, one series is produced per distinct group value among
/// the valid rows, ordered by the value's string form. More than
/// `max_groups` groups is an error; groups are never dropped.
#[instrument(skip(table), fields(rows = table.num_rows()))]
pub fn violin(
    table: &IntervalTable,
    column: &str,
    group_by: Option<&str>,
    max_groups: usize,
) -> Result<ChartDescription<ViolinMetadata>> {
    let valid = table
        .valid_intervals(column)?
        .require_rows(&format!("No valid data for column '{column}'"))?;

    let Some(group_column) = group_by else {
        let total_samples = valid.len();
        let summary = DistributionSummary::from_values(&valid.grades);
        return Ok(ChartDescription {
            series: vec![distribution(column, valid.grades)],
            layout: layout(column, None),
            metadata: ViolinMetadata {
                column: column.to_string(),
                group_by: None,
                group_count: 1,
                total_samples,
                summary,
            },
        });
    };

    let labels = table.string_values(group_column)?;
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (row, grade) in valid.rows.iter().zip(&valid.grades) {
        if let Some(label) = &labels[*row] {
            groups.entry(label.clone()).or_default().push(*grade);
        }
    }

    if groups.len() > max_groups {
        return Err(DownholeError::CapExceeded {
            limit: max_groups,
            actual: groups.len(),
        });
    }

    let total_samples = groups.values().map(Vec::len).sum();
    Ok(ChartDescription {
        layout: layout(column, Some(group_column)),
        metadata: ViolinMetadata {
            column: column.to_string(),
            group_by: Some(group_column.to_string()),
            group_count: groups.len(),
            total_samples,
            summary: None,
        },
        series: groups
            .into_iter()
            .map(|(label, values)| distribution(&label, values))
            .collect(),
    })
}

fn distribution(name: &str, values: Vec<f64>) -> ChartSeries {
    ChartSeries::Distribution(DistributionSeries {
        name: name.to_string(),
        values,
        show_box: true,
        show_mean_line: true,
    })
}

fn layout(column: &str, group_by: Option<&str>) -> ChartLayout {
    ChartLayout {
        title: match group_by {
            Some(group) => format!("Distribution of {column} by {group}"),
            None => format!("Distribution of {column}"),
        },
        x_axis_title: group_by.unwrap_or_default().to_string(),
        y_axis_title: column.to_string(),
        secondary_y_axis_title: None,
        show_legend: group_by.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_support::table;

    #[test]
    fn test_ungrouped_summary() {
        let t = table(
            &["DH1"; 4],
            &[0.0, 1.0, 2.0, 3.0],
            &[1.0, 2.0, 3.0, 4.0],
            &[("Au", vec![Some(4.0), Some(1.0), Some(3.0), Some(2.0)])],
        );
        let chart = violin(&t, "Au", None, 50).unwrap();

        assert_eq!(chart.series.len(), 1);
        let summary = chart.metadata.summary.unwrap();
        assert_eq!(summary.mean, 2.5);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.q1, 1.75);
        assert_eq!(summary.q3, 3.25);
        assert_eq!(summary.std, 1.25f64.sqrt());
    }

    #[test]
    fn test_groups_sorted_by_label() {
        let t = table(
            &["DH10", "DH2", "DH10", "DH9"],
            &[0.0, 0.0, 1.0, 0.0],
            &[1.0, 1.0, 2.0, 0.0],
            &[("Au", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)])],
        );
        let chart = violin(&t, "Au", Some("hole_id"), 50).unwrap();

        // DH9 has only a zero-length interval, so it is not a group.
        let names: Vec<&str> = chart.series.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["DH10", "DH2"]);
        assert_eq!(chart.metadata.group_count, 2);
        assert_eq!(chart.metadata.total_samples, 3);
        assert!(chart.metadata.summary.is_none());
    }

    #[test]
    fn test_group_cap_is_an_error() {
        let holes: Vec<String> = (0..60).map(|i| format!("DH{i:03}")).collect();
        let hole_refs: Vec<&str> = holes.iter().map(String::as_str).collect();
        let from = vec![0.0; 60];
        let to = vec![1.0; 60];
        let t = table(&hole_refs, &from, &to, &[("Au", vec![Some(1.0); 60])]);

        let err = violin(&t, "Au", Some("hole_id"), 50).unwrap_err();
        assert!(matches!(
            err,
            DownholeError::CapExceeded {
                limit: 50,
                actual: 60
            }
        ));
        assert!(err.to_string().contains("Maximum allowed: 50"));
    }

    #[test]
    fn test_unknown_group_column() {
        let t = table(&["DH1"], &[0.0], &[1.0], &[("Au", vec![Some(1.0)])]);
        assert!(matches!(
            violin(&t, "Au", Some("rock"), 50),
            Err(DownholeError::NotFound { .. })
        ));
    }
}
