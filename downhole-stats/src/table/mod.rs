//! The canonical interval table.
//!
//! Both object shapes are reconciled into an [`IntervalTable`]: an Arrow
//! [`RecordBatch`] with `hole_id` (Utf8), `from` and `to` (Float64), and any
//! number of attribute columns. Continuous attributes are Float64 and
//! categorical attributes are Utf8, but analysis functions accept any column
//! type and coerce on demand without touching the table.

mod builder;
mod preview;

pub use builder::{
    build_interval_table, BuildReport, SkipReason, SkippedAttribute, TableBuilder, UNKNOWN_HOLE,
};
pub use preview::{ColumnSummary, TablePreview, INTERVAL_LENGTH};

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, RecordBatch, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Schema};

use crate::error::{DownholeError, Result};

/// Column holding the drillhole identifier.
pub const HOLE_ID: &str = "hole_id";
/// Column holding the interval start depth.
pub const FROM: &str = "from";
/// Column holding the interval end depth.
pub const TO: &str = "to";

/// Returns true for the three structural column names.
pub fn is_reserved_column(name: &str) -> bool {
    matches!(name, HOLE_ID | FROM | TO)
}

/// A table of depth intervals with attribute columns.
#[derive(Debug, Clone)]
pub struct IntervalTable {
    batch: RecordBatch,
}

impl IntervalTable {
    /// Wraps a batch, normalizing the structural column types.
    ///
    /// `hole_id` is cast to Utf8 and `from`/`to` to Float64. Fails if any of
    /// the three is missing.
    pub fn try_new(batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut columns = Vec::with_capacity(schema.fields().len());

        for required in [HOLE_ID, FROM, TO] {
            if schema.index_of(required).is_err() {
                return Err(DownholeError::not_found(
                    "Column",
                    required,
                    schema.fields().iter().map(|f| f.name().clone()),
                ));
            }
        }

        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            let target = match field.name().as_str() {
                HOLE_ID => Some(DataType::Utf8),
                FROM | TO => Some(DataType::Float64),
                _ => None,
            };
            match target {
                Some(data_type) if column.data_type() != &data_type => {
                    columns.push(cast(column, &data_type)?);
                    fields.push(Field::new(field.name(), data_type, true));
                }
                _ => {
                    columns.push(Arc::clone(column));
                    fields.push(field.as_ref().clone());
                }
            }
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Self { batch })
    }

    /// Assembles a table from structural columns plus attributes.
    pub fn from_columns(
        hole_ids: StringArray,
        from: Float64Array,
        to: Float64Array,
        attributes: Vec<(String, ArrayRef)>,
    ) -> Result<Self> {
        let mut fields = vec![
            Field::new(HOLE_ID, DataType::Utf8, true),
            Field::new(FROM, DataType::Float64, true),
            Field::new(TO, DataType::Float64, true),
        ];
        let mut columns: Vec<ArrayRef> = vec![Arc::new(hole_ids), Arc::new(from), Arc::new(to)];
        for (name, array) in attributes {
            fields.push(Field::new(name, array.data_type().clone(), true));
            columns.push(array);
        }
        Self::try_new(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    /// Returns the underlying batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of intervals.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Names of all columns in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Names of attribute columns (everything except the structural ones).
    pub fn attribute_names(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| !is_reserved_column(name))
            .collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| DownholeError::not_found("Column", name, self.column_names()))
    }

    /// The hole identifier column.
    pub fn hole_ids(&self) -> &StringArray {
        self.batch.column(self.index(HOLE_ID)).as_string::<i32>()
    }

    /// The interval start column.
    pub fn from_depths(&self) -> &Float64Array {
        self.batch.column(self.index(FROM)).as_primitive::<Float64Type>()
    }

    /// The interval end column.
    pub fn to_depths(&self) -> &Float64Array {
        self.batch.column(self.index(TO)).as_primitive::<Float64Type>()
    }

    /// Interval lengths (`to - from`); `None` where either bound is missing.
    pub fn lengths(&self) -> Vec<Option<f64>> {
        self.from_depths()
            .iter()
            .zip(self.to_depths().iter())
            .map(|(from, to)| match (non_nan(from), non_nan(to)) {
                (Some(from), Some(to)) => Some(to - from),
                _ => None,
            })
            .collect()
    }

    /// Returns a copy of this table with an extra (or replaced) column.
    pub fn with_column(&self, name: &str, array: ArrayRef) -> Result<Self> {
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len() + 1);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len() + 1);
        for (field, column) in schema.fields().iter().zip(self.batch.columns()) {
            if field.name() != name {
                fields.push(field.as_ref().clone());
                columns.push(Arc::clone(column));
            }
        }
        fields.push(Field::new(name, array.data_type().clone(), true));
        columns.push(array);
        Self::try_new(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    /// Coerces a column to numeric values.
    ///
    /// Values that cannot be parsed become null and are counted separately
    /// from values that were already missing. NaN counts as missing.
    pub fn coerce_numeric(&self, name: &str) -> Result<CoercedColumn> {
        let column = self.column(name)?;
        let source_nulls = column.null_count();
        let numeric = cast(column, &DataType::Float64)?;
        let numeric = numeric.as_primitive::<Float64Type>();

        let mut nan_count = 0;
        let values: Vec<Option<f64>> = numeric
            .iter()
            .map(|v| {
                let v = v?;
                if v.is_nan() {
                    nan_count += 1;
                    None
                } else {
                    Some(v)
                }
            })
            .collect();

        let coercion_failures = numeric.null_count().saturating_sub(source_nulls);
        Ok(CoercedColumn {
            values,
            source_nulls: source_nulls + nan_count,
            coercion_failures,
        })
    }

    /// Reads a column as display strings, keeping nulls.
    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.column(name)?;
        let strings = cast(column, &DataType::Utf8)?;
        Ok(strings
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Applies the validity mask for an attribute.
    ///
    /// A row is valid when the coerced value is present, its length is
    /// present and the length is strictly positive.
    pub fn valid_intervals(&self, name: &str) -> Result<ValidIntervals> {
        let coerced = self.coerce_numeric(name)?;
        let lengths = self.lengths();

        let mut rows = Vec::new();
        let mut grades = Vec::new();
        let mut valid_lengths = Vec::new();
        for (row, (value, length)) in coerced.values.iter().zip(lengths.iter()).enumerate() {
            if let (Some(value), Some(length)) = (value, length) {
                if *length > 0.0 {
                    rows.push(row);
                    grades.push(*value);
                    valid_lengths.push(*length);
                }
            }
        }

        Ok(ValidIntervals {
            rows,
            grades,
            lengths: valid_lengths,
            total_rows: self.num_rows(),
            null_count: coerced.null_count(),
        })
    }

    fn index(&self, name: &str) -> usize {
        // Structural columns are checked in try_new.
        self.batch.schema().index_of(name).unwrap_or_default()
    }
}

/// A column after numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedColumn {
    /// Coerced values, index-aligned with the table.
    pub values: Vec<Option<f64>>,
    /// Values missing before coercion (null or NaN).
    pub source_nulls: usize,
    /// Values present before coercion that could not be parsed.
    pub coercion_failures: usize,
}

impl CoercedColumn {
    /// Total missing values after coercion.
    pub fn null_count(&self) -> usize {
        self.source_nulls + self.coercion_failures
    }
}

/// The rows of a table that are valid for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidIntervals {
    /// Row indices into the source table.
    pub rows: Vec<usize>,
    /// Attribute values of the valid rows.
    pub grades: Vec<f64>,
    /// Interval lengths of the valid rows.
    pub lengths: Vec<f64>,
    /// Row count of the source table.
    pub total_rows: usize,
    /// Missing values in the attribute after coercion.
    pub null_count: usize,
}

impl ValidIntervals {
    /// Number of valid rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no row is valid.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fails with an empty-result error if no row is valid.
    pub fn require_rows(self, message: &str) -> Result<Self> {
        if self.is_empty() {
            Err(DownholeError::empty_result(message))
        } else {
            Ok(self)
        }
    }
}

fn non_nan(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a table with a float attribute per `(name, values)` pair.
    pub fn table(
        holes: &[&str],
        from: &[f64],
        to: &[f64],
        attributes: &[(&str, Vec<Option<f64>>)],
    ) -> IntervalTable {
        IntervalTable::from_columns(
            StringArray::from(holes.to_vec()),
            Float64Array::from(from.to_vec()),
            Float64Array::from(to.to_vec()),
            attributes
                .iter()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        Arc::new(Float64Array::from(values.clone())) as ArrayRef,
                    )
                })
                .collect(),
        )
        .unwrap()
    }
}
