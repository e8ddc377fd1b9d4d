//! Row and column summaries of a built table.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::json::ArrayWriter;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

use super::IntervalTable;

/// Name of the derived length column added to previews.
pub const INTERVAL_LENGTH: &str = "interval_length";

/// Summary of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub non_null_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<usize>,
}

/// The first rows of a table together with per-column summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePreview {
    pub row_count: usize,
    /// Distinct non-null hole ids.
    pub unique_holes: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnSummary>,
    pub rows: Vec<Map<String, Value>>,
}

impl TablePreview {
    /// Previews `table` with a derived `interval_length` column.
    ///
    /// Summaries cover every row; only the first `max_rows` rows are
    /// rendered as JSON objects. Null fields are omitted from row objects.
    pub fn build(table: &IntervalTable, max_rows: usize) -> Result<Self> {
        let unique_holes = table.hole_ids().iter().flatten().collect::<HashSet<_>>().len();
        let lengths: ArrayRef = Arc::new(Float64Array::from(table.lengths()));
        let table = table.with_column(INTERVAL_LENGTH, lengths)?;
        let batch = table.batch();

        let columns = batch
            .schema()
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, column)| summarize(field.name(), column))
            .collect::<Result<Vec<_>>>()?;

        let shown = batch.slice(0, max_rows.min(batch.num_rows()));
        let mut writer = ArrayWriter::new(Vec::new());
        writer.write(&shown)?;
        writer.finish()?;
        let rows: Vec<Map<String, Value>> = serde_json::from_slice(&writer.into_inner())?;

        Ok(Self {
            row_count: batch.num_rows(),
            unique_holes,
            column_count: batch.num_columns(),
            columns,
            rows,
        })
    }
}

fn summarize(name: &str, column: &ArrayRef) -> Result<ColumnSummary> {
    let null_count = column.null_count();
    let mut summary = ColumnSummary {
        name: name.to_string(),
        dtype: column.data_type().to_string(),
        null_count,
        non_null_count: column.len() - null_count,
        min: None,
        max: None,
        unique_count: None,
    };

    if column.data_type().is_numeric() {
        let values = cast(column, &DataType::Float64)?;
        let values = values.as_primitive::<Float64Type>();
        for v in values.iter().flatten().filter(|v| !v.is_nan()) {
            summary.min = Some(summary.min.map_or(v, |m| m.min(v)));
            summary.max = Some(summary.max.map_or(v, |m| m.max(v)));
        }
    } else if matches!(column.data_type(), DataType::Utf8 | DataType::LargeUtf8) {
        let values = cast(column, &DataType::Utf8)?;
        let distinct: HashSet<&str> = values.as_string::<i32>().iter().flatten().collect();
        summary.unique_count = Some(distinct.len());
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_support::table;

    #[test]
    fn test_preview_adds_interval_length() {
        let t = table(
            &["DH1", "DH1", "DH2"],
            &[0.0, 1.0, 0.0],
            &[1.0, 3.0, 2.5],
            &[("Au", vec![Some(0.5), None, Some(2.0)])],
        );
        let preview = TablePreview::build(&t, 2).unwrap();

        assert_eq!(preview.row_count, 3);
        assert_eq!(preview.unique_holes, 2);
        assert_eq!(preview.column_count, 5);
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[1]["interval_length"], 2.0);
        assert!(!preview.rows[1].contains_key("Au"));

        let au = &preview.columns[3];
        assert_eq!(au.name, "Au");
        assert_eq!(au.null_count, 1);
        assert_eq!(au.min, Some(0.5));
        assert_eq!(au.max, Some(2.0));

        let holes = &preview.columns[0];
        assert_eq!(holes.unique_count, Some(2));
        assert_eq!(holes.min, None);
    }

    #[test]
    fn test_preview_of_empty_table() {
        let t = table(&[], &[], &[], &[]);
        let preview = TablePreview::build(&t, 10).unwrap();
        assert_eq!(preview.row_count, 0);
        assert_eq!(preview.unique_holes, 0);
        assert!(preview.rows.is_empty());
    }
}
