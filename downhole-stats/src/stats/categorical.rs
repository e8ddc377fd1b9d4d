use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::table::IntervalTable;

/// Frequency of one distinct value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    /// Share of non-null rows.
    pub fraction: f64,
    /// Summed interval length of rows holding this value.
    pub total_length: f64,
}

/// Values seen within one hole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoleCategories {
    pub hole_id: String,
    /// Distinct values in order of first appearance.
    pub unique_values: Vec<String>,
    pub interval_count: usize,
    pub null_count: usize,
}

/// Distribution of a categorical attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub total_count: usize,
    pub non_null_count: usize,
    pub null_count: usize,
    pub unique_count: usize,
    /// Most frequent first; ties ordered by value.
    pub value_counts: Vec<ValueCount>,
    /// True when `value_counts` was cut to the category limit.
    pub truncated: bool,
    /// Per-hole coverage, ordered by hole id.
    pub by_hole: Vec<HoleCategories>,
}

/// Summarizes the distinct values of `column`.
///
/// Any column type is accepted; values are compared by their string form.
#[instrument(skip(table), fields(rows = table.num_rows()))]
pub fn categorical_summary(
    table: &IntervalTable,
    column: &str,
    max_categories: usize,
) -> Result<CategoricalSummary> {
    let values = table.string_values(column)?;
    let lengths = table.lengths();

    let mut tallies: HashMap<&str, (usize, f64)> = HashMap::new();
    for (value, length) in values.iter().zip(&lengths) {
        if let Some(value) = value {
            let tally = tallies.entry(value.as_str()).or_insert((0, 0.0));
            tally.0 += 1;
            if let Some(length) = length.filter(|l| *l > 0.0) {
                tally.1 += length;
            }
        }
    }

    let non_null_count: usize = tallies.values().map(|(count, _)| count).sum();
    let mut value_counts: Vec<ValueCount> = tallies
        .into_iter()
        .map(|(value, (count, total_length))| ValueCount {
            value: value.to_string(),
            count,
            fraction: count as f64 / non_null_count as f64,
            total_length,
        })
        .collect();
    value_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

    let unique_count = value_counts.len();
    let truncated = unique_count > max_categories;
    value_counts.truncate(max_categories);

    Ok(CategoricalSummary {
        column: column.to_string(),
        total_count: values.len(),
        non_null_count,
        null_count: values.len() - non_null_count,
        unique_count,
        value_counts,
        truncated,
        by_hole: by_hole(table, &values),
    })
}

fn by_hole(table: &IntervalTable, values: &[Option<String>]) -> Vec<HoleCategories> {
    let mut holes: BTreeMap<&str, HoleCategories> = BTreeMap::new();
    for (hole_id, value) in table.hole_ids().iter().zip(values) {
        let Some(hole_id) = hole_id else { continue };
        let entry = holes.entry(hole_id).or_insert_with(|| HoleCategories {
            hole_id: hole_id.to_string(),
            unique_values: Vec::new(),
            interval_count: 0,
            null_count: 0,
        });
        entry.interval_count += 1;
        match value {
            Some(value) if !entry.unique_values.contains(value) => {
                entry.unique_values.push(value.clone())
            }
            Some(_) => {}
            None => entry.null_count += 1,
        }
    }
    holes.into_values().collect()
}
