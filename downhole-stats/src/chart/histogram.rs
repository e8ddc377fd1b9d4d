use serde::Serialize;
use tracing::instrument;

use crate::error::{DownholeError, Result};
use crate::table::IntervalTable;

use super::{Axis, BarSeries, ChartDescription, ChartLayout, ChartSeries, Visibility};

pub const COUNT_SERIES: &str = "Sample count";
pub const WEIGHTED_SERIES: &str = "Length-weighted";

/// Binning details of a histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramMetadata {
    pub column: String,
    pub bin_count: usize,
    pub total_samples: usize,
    pub total_length: f64,
    /// `[min, max]` of the valid values.
    pub value_range: [f64; 2],
    pub bin_edges: Vec<f64>,
}

/// Equal-width bin edges spanning `[min, max]`.
///
/// Returns `bins + 1` edges. A zero-width range is widened to
/// `[min - 0.5, max + 0.5]`.
pub fn bin_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    let (first, last) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let step = (last - first) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| first + i as f64 * step).collect();
    if let Some(edge) = edges.last_mut() {
        *edge = last;
    }
    edges
}

/// Bin of `value` among equal-width `edges`.
///
/// Bins are half-open except the last, which includes its upper edge.
fn bin_index(value: f64, edges: &[f64]) -> Option<usize> {
    let bins = edges.len().checked_sub(1)?;
    let (first, last) = (edges[0], edges[bins]);
    if bins == 0 || value < first || value > last {
        return None;
    }
    if value == last {
        return Some(bins - 1);
    }

    let mut index = (((value - first) / (last - first)) * bins as f64) as usize;
    index = index.min(bins - 1);
    // Float rounding can land one bin off; settle against the actual edges.
    if value < edges[index] {
        index -= 1;
    } else if index + 1 < bins && value >= edges[index + 1] {
        index += 1;
    }
    Some(index)
}

/// Builds count and length-weighted histograms over the valid rows of `column`.
///
/// Both series share the same bin edges. The weighted series is plotted on
/// a secondary axis and starts hidden.
#[instrument(skip(table), fields(rows = table.num_rows()))]
pub fn histogram(
    table: &IntervalTable,
    column: &str,
    bins: usize,
) -> Result<ChartDescription<HistogramMetadata>> {
    if bins == 0 {
        return Err(DownholeError::InvalidArgument(
            "bins must be at least 1".to_string(),
        ));
    }
    let valid = table
        .valid_intervals(column)?
        .require_rows(&format!("No valid data for column '{column}'"))?;

    let (min, max) = valid
        .grades
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &g| {
            (lo.min(g), hi.max(g))
        });
    let edges = bin_edges(min, max, bins);

    let mut counts = vec![0.0; bins];
    let mut weighted = vec![0.0; bins];
    for (grade, length) in valid.grades.iter().zip(&valid.lengths) {
        if let Some(index) = bin_index(*grade, &edges) {
            counts[index] += 1.0;
            weighted[index] += length;
        }
    }

    let centers: Vec<f64> = edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    let widths: Vec<f64> = edges.windows(2).map(|w| w[1] - w[0]).collect();

    Ok(ChartDescription {
        series: vec![
            ChartSeries::Bar(BarSeries {
                name: COUNT_SERIES.to_string(),
                x: centers.clone(),
                y: counts,
                width: widths.clone(),
                axis: Axis::Primary,
                visibility: Visibility::Visible,
            }),
            ChartSeries::Bar(BarSeries {
                name: WEIGHTED_SERIES.to_string(),
                x: centers,
                y: weighted,
                width: widths,
                axis: Axis::Secondary,
                visibility: Visibility::LegendOnly,
            }),
        ],
        layout: ChartLayout {
            title: format!("Distribution of {column}"),
            x_axis_title: column.to_string(),
            y_axis_title: "Count".to_string(),
            secondary_y_axis_title: Some("Total length".to_string()),
            show_legend: true,
        },
        metadata: HistogramMetadata {
            column: column.to_string(),
            bin_count: bins,
            total_samples: valid.len(),
            total_length: valid.lengths.iter().sum(),
            value_range: [min, max],
            bin_edges: edges,
        },
    })
}
