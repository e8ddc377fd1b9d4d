//! Depth discontinuities between consecutive intervals of a hole.
//!
//! Within each hole, intervals are ordered by `from`. A gap is reported when
//! the next interval starts below the end of the current one. Overlapping
//! intervals are not reported.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::stats::round_to;
use crate::table::IntervalTable;

/// One unsampled depth range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gap {
    pub hole_id: String,
    pub gap_start: f64,
    pub gap_end: f64,
    pub gap_length: f64,
}

/// Gap figures for one hole with at least one gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoleGapStatistics {
    pub hole_id: String,
    pub gap_count: usize,
    pub total_gap_length: f64,
    pub min_gap: f64,
    pub max_gap: f64,
    pub mean_gap: f64,
}

/// Gap analysis over every hole of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReport {
    pub total_gap_count: usize,
    pub total_gap_length: f64,
    pub holes_with_gaps: usize,
    pub holes_without_gaps: usize,
    /// Holes with gaps, ordered by hole id.
    pub by_hole: Vec<HoleGapStatistics>,
    /// Every gap, grouped by hole in order of first appearance.
    pub gaps: Vec<Gap>,
}

impl GapReport {
    /// Returns a copy with every float rounded to `places` decimals.
    pub fn rounded(&self, places: i32) -> Self {
        Self {
            total_gap_length: round_to(self.total_gap_length, places),
            by_hole: self
                .by_hole
                .iter()
                .map(|h| HoleGapStatistics {
                    hole_id: h.hole_id.clone(),
                    gap_count: h.gap_count,
                    total_gap_length: round_to(h.total_gap_length, places),
                    min_gap: round_to(h.min_gap, places),
                    max_gap: round_to(h.max_gap, places),
                    mean_gap: round_to(h.mean_gap, places),
                })
                .collect(),
            gaps: self
                .gaps
                .iter()
                .map(|g| Gap {
                    hole_id: g.hole_id.clone(),
                    gap_start: round_to(g.gap_start, places),
                    gap_end: round_to(g.gap_end, places),
                    gap_length: round_to(g.gap_length, places),
                })
                .collect(),
            ..*self
        }
    }
}

/// Finds every gap in `table`.
///
/// Rows with a missing hole id or depth are ignored.
#[instrument(skip(table), fields(rows = table.num_rows()))]
pub fn analyze_gaps(table: &IntervalTable) -> GapReport {
    let mut order: Vec<&str> = Vec::new();
    let mut intervals: HashMap<&str, Vec<(f64, f64)>> = HashMap::new();

    let rows = table
        .hole_ids()
        .iter()
        .zip(table.from_depths().iter())
        .zip(table.to_depths().iter());
    for ((hole_id, from), to) in rows {
        let Some(hole_id) = hole_id else { continue };
        let entry = intervals.entry(hole_id).or_insert_with(|| {
            order.push(hole_id);
            Vec::new()
        });
        if let (Some(from), Some(to)) = (from, to) {
            if !from.is_nan() && !to.is_nan() {
                entry.push((from, to));
            }
        }
    }

    let mut gaps = Vec::new();
    let mut by_hole = BTreeMap::new();
    for hole_id in &order {
        let Some(hole) = intervals.get_mut(hole_id) else { continue };
        hole.sort_by(|a, b| a.0.total_cmp(&b.0));

        let hole_gaps: Vec<Gap> = hole
            .windows(2)
            .filter(|pair| pair[1].0 > pair[0].1)
            .map(|pair| Gap {
                hole_id: hole_id.to_string(),
                gap_start: pair[0].1,
                gap_end: pair[1].0,
                gap_length: pair[1].0 - pair[0].1,
            })
            .collect();

        if let Some(stats) = hole_gap_statistics(hole_id, &hole_gaps) {
            by_hole.insert(hole_id.to_string(), stats);
        }
        gaps.extend(hole_gaps);
    }

    let report = GapReport {
        total_gap_count: gaps.len(),
        total_gap_length: gaps.iter().map(|g| g.gap_length).sum(),
        holes_with_gaps: by_hole.len(),
        holes_without_gaps: order.len() - by_hole.len(),
        by_hole: by_hole.into_values().collect(),
        gaps,
    };
    debug!(
        gaps = report.total_gap_count,
        holes_with_gaps = report.holes_with_gaps,
        "Gap analysis complete"
    );
    report
}

fn hole_gap_statistics(hole_id: &str, gaps: &[Gap]) -> Option<HoleGapStatistics> {
    if gaps.is_empty() {
        return None;
    }
    let lengths = gaps.iter().map(|g| g.gap_length);
    let total: f64 = lengths.clone().sum();
    Some(HoleGapStatistics {
        hole_id: hole_id.to_string(),
        gap_count: gaps.len(),
        total_gap_length: total,
        min_gap: lengths.clone().fold(f64::INFINITY, f64::min),
        max_gap: lengths.fold(f64::NEG_INFINITY, f64::max),
        mean_gap: total / gaps.len() as f64,
    })
}
