//! Categorical attribute resolution.
//!
//! Categorical attributes are stored compactly as an integer key column plus a
//! lookup table of `key -> value` pairs. Resolution joins the two, keeping the
//! key column's length and row order. Keys with no lookup entry become null
//! and are counted, never raised.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, RecordBatch, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type};
use tracing::{debug, instrument};

use crate::error::{DownholeError, Result};
use crate::object::ObjectReference;
use crate::source::ObjectSource;

/// An ordered mapping from integer key to string value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: BTreeMap<i64, String>,
}

impl LookupTable {
    /// Creates a lookup table from key/value pairs.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }

    /// Decodes a lookup table from a two-column batch.
    ///
    /// Columns named `key` and `value` are used when present; otherwise the
    /// first two columns are taken positionally. Rows with a null key or value
    /// are dropped.
    pub fn from_batch(batch: &RecordBatch) -> Result<Self> {
        let (key_idx, value_idx) = match (
            batch.schema().index_of("key"),
            batch.schema().index_of("value"),
        ) {
            (Ok(k), Ok(v)) => (k, v),
            _ if batch.num_columns() >= 2 => (0, 1),
            _ => {
                return Err(DownholeError::invalid_object(format!(
                    "lookup table needs key and value columns, found {} column(s)",
                    batch.num_columns()
                )))
            }
        };

        let keys = cast(batch.column(key_idx), &DataType::Int64)?;
        let keys = keys.as_primitive::<Int64Type>();
        let values = cast(batch.column(value_idx), &DataType::Utf8)?;
        let values = values.as_string::<i32>();

        let entries = (0..batch.num_rows())
            .filter(|&i| keys.is_valid(i) && values.is_valid(i))
            .map(|i| (keys.value(i), values.value(i).to_string()))
            .collect();

        Ok(Self { entries })
    }

    /// Looks up a single key.
    pub fn get(&self, key: i64) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maps a key column through the table.
    ///
    /// The output has the same length and order as `keys`. Null keys stay
    /// null; keys without an entry become null and are counted as unresolved.
    pub fn resolve(&self, keys: &dyn Array) -> Result<ResolvedColumn> {
        let keys = cast(keys, &DataType::Int64)?;
        let keys = keys.as_primitive::<Int64Type>();

        let mut unresolved = 0;
        let values: StringArray = keys
            .iter()
            .map(|key| {
                let key = key?;
                let value = self.get(key);
                if value.is_none() {
                    unresolved += 1;
                }
                value
            })
            .collect();

        Ok(ResolvedColumn { values, unresolved })
    }
}

/// A resolved categorical column.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    /// Resolved string values, index-aligned with the key column.
    pub values: StringArray,
    /// Number of non-null keys that had no lookup entry.
    pub unresolved: usize,
}

impl ResolvedColumn {
    /// Returns the values as a type-erased array.
    pub fn into_array(self) -> ArrayRef {
        Arc::new(self.values)
    }
}

/// Resolves the categorical attribute rooted at `attribute_path`.
///
/// The lookup table is read from `<path>.table` and the integer keys from the
/// first column of `<path>.values`.
#[instrument(skip(source), fields(reference = %reference))]
pub async fn resolve_categorical<S>(
    source: &S,
    reference: &ObjectReference,
    attribute_path: &str,
) -> Result<ResolvedColumn>
where
    S: ObjectSource + ?Sized,
{
    let lookup = source
        .fetch_lookup_table(reference, &format!("{attribute_path}.table"))
        .await?;

    let values_path = format!("{attribute_path}.values");
    let keys = source.fetch_table(reference, &values_path).await?;
    if keys.num_columns() == 0 {
        return Err(DownholeError::retrieval(values_path, "key table has no columns"));
    }

    let resolved = lookup.resolve(keys.column(0).as_ref())?;
    debug!(
        path = attribute_path,
        lookup_entries = lookup.len(),
        rows = resolved.values.len(),
        unresolved = resolved.unresolved,
        "Resolved categorical attribute"
    );
    Ok(resolved)
}
