//! Chart-library-agnostic chart descriptions.
//!
//! A [`ChartDescription`] carries named data series, layout hints and
//! chart-specific metadata. Rendering is left to the consumer.

mod histogram;
mod violin;

pub use histogram::{bin_edges, histogram, HistogramMetadata};
pub use violin::{violin, DistributionSummary, ViolinMetadata};

use serde::Serialize;

/// Which value axis a series is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Primary,
    /// A right-hand value axis.
    Secondary,
}

/// Initial visibility of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    /// Hidden until toggled from the legend.
    LegendOnly,
}

/// Bars at `x` with heights `y` and widths `width`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub width: Vec<f64>,
    pub axis: Axis,
    pub visibility: Visibility,
}

/// Raw values of one distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSeries {
    pub name: String,
    pub values: Vec<f64>,
    pub show_box: bool,
    pub show_mean_line: bool,
}

/// One data series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSeries {
    Bar(BarSeries),
    Distribution(DistributionSeries),
}

impl ChartSeries {
    pub fn name(&self) -> &str {
        match self {
            Self::Bar(series) => &series.name,
            Self::Distribution(series) => &series.name,
        }
    }
}

/// Titles and axis hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_y_axis_title: Option<String>,
    pub show_legend: bool,
}

/// Series, layout and metadata of one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescription<M> {
    pub series: Vec<ChartSeries>,
    pub layout: ChartLayout,
    pub metadata: M,
}

impl<M> ChartDescription<M> {
    /// Finds a series by name.
    pub fn series_named(&self, name: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.name() == name)
    }
}
