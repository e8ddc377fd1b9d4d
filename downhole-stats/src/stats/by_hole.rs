use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, Float64Array, RecordBatch, UInt32Array};
use arrow::compute::{cast, take};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::error::{DownholeError, Result};
use crate::table::{IntervalTable, HOLE_ID};

use super::round_to;

const GROUPED_SQL: &str = "SELECT hole_id, \
     MIN(grade) AS grade_min, \
     MAX(grade) AS grade_max, \
     AVG(grade) AS grade_mean, \
     COUNT(grade) AS grade_count, \
     SUM(interval_length) AS total_length, \
     SUM(grade * interval_length) AS accumulation \
     FROM intervals \
     WHERE hole_id IS NOT NULL \
     GROUP BY hole_id \
     ORDER BY hole_id";

/// Statistics of one attribute within one hole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoleStatistics {
    pub hole_id: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: u64,
    pub total_length: f64,
    pub accumulation: f64,
    /// `None` when the hole's total length is 0.
    pub length_weighted_mean: Option<f64>,
}

impl HoleStatistics {
    /// Returns a copy with every float rounded to `places` decimals.
    pub fn rounded(&self, places: i32) -> Self {
        Self {
            hole_id: self.hole_id.clone(),
            min: round_to(self.min, places),
            max: round_to(self.max, places),
            mean: round_to(self.mean, places),
            count: self.count,
            total_length: round_to(self.total_length, places),
            accumulation: round_to(self.accumulation, places),
            length_weighted_mean: self.length_weighted_mean.map(|v| round_to(v, places)),
        }
    }
}

/// Highlights across per-hole statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoleSummary {
    pub hole_count: usize,
    pub best_by_weighted_mean: Option<String>,
    pub best_by_max_grade: Option<String>,
    /// Hole with the largest total sampled length.
    pub most_sampled: Option<String>,
}

/// Computes per-hole statistics for `column`, ordered by hole id.
///
/// The masked rows are registered with a DataFusion session and aggregated
/// with a grouped query. Rows with a null hole id are not reported.
#[instrument(skip(table, config), fields(rows = table.num_rows()))]
pub async fn statistics_by_hole(
    table: &IntervalTable,
    column: &str,
    config: &EngineConfig,
) -> Result<Vec<HoleStatistics>> {
    let valid = table
        .valid_intervals(column)?
        .require_rows(&format!("No valid data for column '{column}'"))?;

    let indices = UInt32Array::from_iter_values(valid.rows.iter().map(|&row| row as u32));
    let hole_ids = take(table.column(HOLE_ID)?.as_ref(), &indices, None)?;
    let masked = RecordBatch::try_new(
        Arc::new(Schema::new(vec![
            Field::new("hole_id", DataType::Utf8, true),
            Field::new("grade", DataType::Float64, false),
            Field::new("interval_length", DataType::Float64, false),
        ])),
        vec![
            hole_ids,
            Arc::new(Float64Array::from(valid.grades)) as ArrayRef,
            Arc::new(Float64Array::from(valid.lengths)),
        ],
    )?;

    let ctx = config.session_context();
    ctx.register_batch("intervals", masked)?;
    let batches = ctx.sql(GROUPED_SQL).await?.collect().await?;

    let mut holes = Vec::new();
    for batch in &batches {
        read_grouped(batch, &mut holes)?;
    }

    debug!(column, holes = holes.len(), "Computed per-hole statistics");
    Ok(holes)
}

fn read_grouped(batch: &RecordBatch, out: &mut Vec<HoleStatistics>) -> Result<()> {
    let float = |name: &str| -> Result<Float64Array> {
        let column = batch
            .column_by_name(name)
            .ok_or_else(|| DownholeError::Internal(format!("grouped query lost column {name}")))?;
        Ok(cast(column, &DataType::Float64)?
            .as_primitive::<Float64Type>()
            .clone())
    };

    let hole_ids = cast(batch.column(0), &DataType::Utf8)?;
    let hole_ids = hole_ids.as_string::<i32>();
    let counts = cast(
        batch
            .column_by_name("grade_count")
            .ok_or_else(|| DownholeError::Internal("grouped query lost grade_count".into()))?,
        &DataType::Int64,
    )?;
    let counts = counts.as_primitive::<Int64Type>();
    let (min, max, mean) = (float("grade_min")?, float("grade_max")?, float("grade_mean")?);
    let (total_length, accumulation) = (float("total_length")?, float("accumulation")?);

    for row in 0..batch.num_rows() {
        let total = total_length.value(row);
        let acc = accumulation.value(row);
        out.push(HoleStatistics {
            hole_id: hole_ids.value(row).to_string(),
            min: min.value(row),
            max: max.value(row),
            mean: mean.value(row),
            count: counts.value(row).max(0) as u64,
            total_length: total,
            accumulation: acc,
            length_weighted_mean: (total > 0.0).then(|| acc / total),
        });
    }
    Ok(())
}

/// Picks the standout holes. Ties keep the earliest hole.
pub fn summarize_holes(holes: &[HoleStatistics]) -> HoleSummary {
    fn best_by(
        holes: &[HoleStatistics],
        key: impl Fn(&HoleStatistics) -> Option<f64>,
    ) -> Option<String> {
        let mut best: Option<(&HoleStatistics, f64)> = None;
        for hole in holes {
            if let Some(value) = key(hole) {
                if best.is_none_or(|(_, current)| value > current) {
                    best = Some((hole, value));
                }
            }
        }
        best.map(|(hole, _)| hole.hole_id.clone())
    }

    HoleSummary {
        hole_count: holes.len(),
        best_by_weighted_mean: best_by(holes, |h| h.length_weighted_mean),
        best_by_max_grade: best_by(holes, |h| Some(h.max)),
        most_sampled: best_by(holes, |h| Some(h.total_length)),
    }
}
