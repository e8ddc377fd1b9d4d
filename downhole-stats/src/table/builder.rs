//! Assembles an [`IntervalTable`] from either object shape.

use std::collections::HashSet;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, RecordBatch, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{DownholeError, Result};
use crate::logging::LogConfig;
use crate::object::{
    attribute_name, collection_attributes, AttributeKind, DownholeObject, ObjectReference,
    ObjectShape, FLAT_COLLECTION_NAME,
};
use crate::resolver::{resolve_categorical, LookupTable};
use crate::source::ObjectSource;
use crate::{log_data_op, log_resolution};

use super::{is_reserved_column, IntervalTable};

/// Placeholder hole id used when a flat object's hole ids cannot be resolved.
pub const UNKNOWN_HOLE: &str = "UNKNOWN";

/// Why an attribute did not become a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The name is one of `hole_id`, `from` or `to`.
    ReservedName,
    /// An earlier attribute already uses the name.
    DuplicateName,
    /// Neither a lookup table nor a value array.
    UnsupportedShape,
    /// The retrieved column does not match the interval count.
    LengthMismatch { expected: usize, actual: usize },
    /// Retrieval or resolution failed.
    Retrieval { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservedName => f.write_str("name collides with a structural column"),
            Self::DuplicateName => f.write_str("duplicate attribute name"),
            Self::UnsupportedShape => f.write_str("neither categorical nor continuous"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} values, got {actual}")
            }
            Self::Retrieval { message } => write!(f, "retrieval failed: {message}"),
        }
    }
}

/// An attribute left out of the built table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAttribute {
    pub name: String,
    pub reason: SkipReason,
}

/// The outcome of a table build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// The assembled table.
    pub table: IntervalTable,
    /// Shape of the source object.
    pub shape: ObjectShape,
    /// Collection the table was built from.
    pub collection: String,
    /// Attribute columns present in the table, in declaration order.
    pub resolved: Vec<String>,
    /// Attributes that were declared but are not in the table.
    pub skipped: Vec<SkippedAttribute>,
    /// True when every hole id was replaced by [`UNKNOWN_HOLE`].
    pub hole_id_placeholder: bool,
}

/// Builds the interval table for `collection_name` with default logging.
///
/// Flat interval objects have a single implicit collection, so the name is
/// ignored for them.
pub async fn build_interval_table<S>(
    source: &S,
    object: &DownholeObject,
    collection_name: &str,
) -> Result<BuildReport>
where
    S: ObjectSource + ?Sized,
{
    TableBuilder::new(source)
        .build(object, collection_name)
        .await
}

/// Builds interval tables from objects held by an [`ObjectSource`].
#[derive(Debug)]
pub struct TableBuilder<'a, S: ?Sized> {
    source: &'a S,
    log: LogConfig,
}

impl<'a, S> TableBuilder<'a, S>
where
    S: ObjectSource + ?Sized,
{
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            log: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Builds the table, branching once on the object's shape.
    #[instrument(skip(self, object), fields(reference = %object.reference(), shape = %object.shape()))]
    pub async fn build(
        &self,
        object: &DownholeObject,
        collection_name: &str,
    ) -> Result<BuildReport> {
        let report = match object.ensure_supported()? {
            ObjectShape::FlatIntervals => self.build_flat(object).await?,
            _ => self.build_nested(object, collection_name).await?,
        };

        log_data_op!(
            self.log,
            collection = %report.collection,
            rows = report.table.num_rows(),
            resolved = report.resolved.len(),
            skipped = report.skipped.len(),
            "Built interval table"
        );
        Ok(report)
    }

    async fn build_nested(
        &self,
        object: &DownholeObject,
        collection_name: &str,
    ) -> Result<BuildReport> {
        let reference = object.reference();
        let (index, collection) = object.find_collection(collection_name)?;
        let prefix = format!("collections[{index}]");

        let bounds = self
            .source
            .fetch_table(reference, &format!("{prefix}.from_to.intervals.start_and_end"))
            .await?;
        let (from, to) = split_bounds(&bounds)?;

        let runs = self
            .source
            .fetch_table(reference, &format!("{prefix}.holes"))
            .await?;
        let lookup = self
            .source
            .fetch_lookup_table(reference, "location.hole_id.table")
            .await?;
        let hole_ids = expand_hole_runs(&runs, &lookup, from.len())?;

        let (attributes, resolved, skipped) = self
            .resolve_attributes(
                reference,
                collection_attributes(collection),
                &format!("{prefix}.from_to.attributes"),
                from.len(),
            )
            .await;

        Ok(BuildReport {
            table: IntervalTable::from_columns(hole_ids, from, to, attributes)?,
            shape: ObjectShape::NestedCollection,
            collection: collection_name.to_string(),
            resolved,
            skipped,
            hole_id_placeholder: false,
        })
    }

    async fn build_flat(&self, object: &DownholeObject) -> Result<BuildReport> {
        let reference = object.reference();
        let bounds = self
            .source
            .fetch_table(reference, "from_to.intervals.start_and_end")
            .await?;
        let (from, to) = split_bounds(&bounds)?;
        let rows = from.len();

        let (hole_ids, hole_id_placeholder) = match self.flat_hole_ids(reference, rows).await {
            Ok(hole_ids) => (hole_ids, false),
            Err(e) => {
                warn!(
                    error = %self.log.truncate(&e.to_string()),
                    rows,
                    "Could not resolve hole ids, using placeholder"
                );
                (StringArray::from(vec![UNKNOWN_HOLE; rows]), true)
            }
        };

        let (attributes, resolved, skipped) = self
            .resolve_attributes(reference, object.root_attributes(), "attributes", rows)
            .await;

        Ok(BuildReport {
            table: IntervalTable::from_columns(hole_ids, from, to, attributes)?,
            shape: ObjectShape::FlatIntervals,
            collection: FLAT_COLLECTION_NAME.to_string(),
            resolved,
            skipped,
            hole_id_placeholder,
        })
    }

    async fn flat_hole_ids(&self, reference: &ObjectReference, rows: usize) -> Result<StringArray> {
        let batch = self.source.fetch_category_table(reference, "hole_id").await?;
        if batch.num_columns() == 0 {
            return Err(DownholeError::retrieval("hole_id", "category table has no columns"));
        }
        let values = cast(batch.column(0), &DataType::Utf8)?;
        if values.len() != rows {
            return Err(DownholeError::invalid_object(format!(
                "hole_id has {} values for {rows} intervals",
                values.len()
            )));
        }
        Ok(values.as_string::<i32>().clone())
    }

    /// Retrieves all usable attributes concurrently.
    ///
    /// Every failure is isolated to its attribute and reported as a skip.
    async fn resolve_attributes(
        &self,
        reference: &ObjectReference,
        declared: &[Value],
        path_prefix: &str,
        rows: usize,
    ) -> (Vec<(String, ArrayRef)>, Vec<String>, Vec<SkippedAttribute>) {
        let mut skipped = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for (index, attribute) in declared.iter().enumerate() {
            let name = attribute_name(attribute, index);
            let kind = AttributeKind::classify(attribute);
            let reason = if is_reserved_column(&name) {
                Some(SkipReason::ReservedName)
            } else if !seen.insert(name.clone()) {
                Some(SkipReason::DuplicateName)
            } else if kind == AttributeKind::Unsupported {
                Some(SkipReason::UnsupportedShape)
            } else {
                None
            };

            match reason {
                Some(reason) => skipped.push(SkippedAttribute { name, reason }),
                None => pending.push((name, kind, format!("{path_prefix}[{index}]"))),
            }
        }

        let fetched = join_all(
            pending
                .iter()
                .map(|(_, kind, path)| self.fetch_attribute(reference, *kind, path)),
        )
        .await;

        let mut columns = Vec::new();
        let mut resolved = Vec::new();
        for ((name, kind, path), result) in pending.into_iter().zip(fetched) {
            match result {
                Ok(array) if array.len() == rows => {
                    log_resolution!(
                        self.log,
                        attribute = %name,
                        ?kind,
                        path = %path,
                        "Resolved attribute"
                    );
                    resolved.push(name.clone());
                    columns.push((name, array));
                }
                Ok(array) => skipped.push(SkippedAttribute {
                    name,
                    reason: SkipReason::LengthMismatch {
                        expected: rows,
                        actual: array.len(),
                    },
                }),
                Err(e) => skipped.push(SkippedAttribute {
                    name,
                    reason: SkipReason::Retrieval {
                        message: e.to_string(),
                    },
                }),
            }
        }

        for skip in &skipped {
            warn!(
                attribute = %skip.name,
                reason = %self.log.truncate(&skip.reason.to_string()),
                "Skipping attribute"
            );
        }
        if !skipped.is_empty() {
            info!(
                resolved = resolved.len(),
                skipped = skipped.len(),
                "Attribute resolution finished with skips"
            );
        }

        (columns, resolved, skipped)
    }

    async fn fetch_attribute(
        &self,
        reference: &ObjectReference,
        kind: AttributeKind,
        path: &str,
    ) -> Result<ArrayRef> {
        match kind {
            AttributeKind::Categorical => Ok(resolve_categorical(self.source, reference, path)
                .await?
                .into_array()),
            _ => {
                let values_path = format!("{path}.values");
                let batch = self.source.fetch_table(reference, &values_path).await?;
                if batch.num_columns() == 0 {
                    return Err(DownholeError::retrieval(values_path, "value table has no columns"));
                }
                Ok(cast(batch.column(0), &DataType::Float64)?)
            }
        }
    }
}

/// Splits a start/end table into `from` and `to` columns.
fn split_bounds(bounds: &RecordBatch) -> Result<(Float64Array, Float64Array)> {
    if bounds.num_columns() < 2 {
        return Err(DownholeError::invalid_object(format!(
            "interval bounds need two columns, found {}",
            bounds.num_columns()
        )));
    }
    let from = cast(bounds.column(0), &DataType::Float64)?;
    let to = cast(bounds.column(1), &DataType::Float64)?;
    Ok((
        from.as_primitive::<Float64Type>().clone(),
        to.as_primitive::<Float64Type>().clone(),
    ))
}

/// Expands `(hole_index, count)` runs into one hole id per interval.
///
/// Indices missing from the lookup become `UNKNOWN_<index>`. The counts must
/// add up to exactly `rows`.
fn expand_hole_runs(runs: &RecordBatch, lookup: &LookupTable, rows: usize) -> Result<StringArray> {
    let (index_col, count_col) = match (
        runs.schema().index_of("hole_index"),
        runs.schema().index_of("count"),
    ) {
        (Ok(i), Ok(c)) => (i, c),
        _ if runs.num_columns() >= 2 => (0, 1),
        _ => {
            return Err(DownholeError::invalid_object(
                "hole mapping needs hole_index and count columns",
            ))
        }
    };

    let indices = cast(runs.column(index_col), &DataType::Int64)?;
    let indices = indices.as_primitive::<Int64Type>();
    let counts = cast(runs.column(count_col), &DataType::Int64)?;
    let counts = counts.as_primitive::<Int64Type>();

    let covered: i64 = counts.iter().flatten().map(|c| c.max(0)).sum();
    if covered != rows as i64 {
        return Err(DownholeError::invalid_object(format!(
            "hole mapping covers {covered} intervals but the collection has {rows}"
        )));
    }

    let mut hole_ids: Vec<String> = Vec::with_capacity(rows);
    for (index, count) in indices.iter().zip(counts.iter()) {
        let count = count.unwrap_or(0).max(0) as usize;
        let hole_id = match index {
            Some(index) => lookup
                .get(index)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{UNKNOWN_HOLE}_{index}")),
            None => UNKNOWN_HOLE.to_string(),
        };
        hole_ids.extend(std::iter::repeat_n(hole_id, count));
    }
    Ok(StringArray::from(hole_ids))
}
