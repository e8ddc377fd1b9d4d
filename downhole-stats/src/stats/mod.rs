//! Length-weighted interval statistics.
//!
//! Every computation here starts from [`IntervalTable::valid_intervals`]:
//! a row contributes only when its attribute value is present and its
//! interval length is present and strictly positive.
//!
//! [`IntervalTable::valid_intervals`]: crate::table::IntervalTable::valid_intervals

mod batch;
mod by_hole;
mod categorical;
mod interval;

pub use batch::{multi_attribute_statistics, BatchStatistics, BatchStatus};
pub use by_hole::{statistics_by_hole, summarize_holes, HoleStatistics, HoleSummary};
pub use categorical::{categorical_summary, CategoricalSummary, HoleCategories, ValueCount};
pub use interval::{interval_statistics, DataQuality, IntervalStatistics};

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Standard deviation with `ddof` delta degrees of freedom.
///
/// Returns `None` when there are not more than `ddof` values.
pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    if values.len() <= ddof {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - ddof) as f64).sqrt())
}

/// Percentile of ascending-sorted values with linear interpolation.
///
/// `q` is a fraction in `[0, 1]`.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
