//! Object retrieval boundary.
//!
//! The engine never talks to a remote store directly. Everything it needs is
//! pulled through [`ObjectSource`]: the structural dictionary of an object and
//! the arrays addressed by path expressions inside it. Transport,
//! authentication and caching belong to the implementor.

use arrow::array::RecordBatch;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::error::Result;
use crate::object::{DownholeObject, ObjectReference};
use crate::resolver::LookupTable;

mod in_memory;

pub use in_memory::InMemorySource;

/// A store that can deliver object definitions and the data they reference.
///
/// Path expressions address fields inside the structural dictionary, e.g.
/// `collections[0].from_to.intervals.start_and_end` or `attributes[2].values`.
///
/// # Examples
///
/// ```rust,ignore
/// use downhole_stats::source::{InMemorySource, ObjectSource};
///
/// # async fn example(reference: downhole_stats::object::ObjectReference) -> downhole_stats::error::Result<()> {
/// let source = InMemorySource::new();
/// let object = source.load(&reference).await?;
/// let intervals = source
///     .fetch_table(&reference, "from_to.intervals.start_and_end")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ObjectSource: Debug + Send + Sync {
    /// Retrieves an object's structural dictionary.
    async fn fetch_object(&self, reference: &ObjectReference) -> Result<Value>;

    /// Retrieves the table addressed by `path`.
    ///
    /// Used for from/to pairs (two float columns), run-length hole mappings
    /// (`hole_index`, `count`), single-column value arrays and lookup tables.
    async fn fetch_table(&self, reference: &ObjectReference, path: &str) -> Result<RecordBatch>;

    /// Retrieves a categorical column with its keys already resolved.
    ///
    /// The returned batch holds a single string column.
    async fn fetch_category_table(
        &self,
        reference: &ObjectReference,
        path: &str,
    ) -> Result<RecordBatch>;

    /// Retrieves and decodes a lookup table.
    async fn fetch_lookup_table(
        &self,
        reference: &ObjectReference,
        path: &str,
    ) -> Result<LookupTable> {
        let batch = self.fetch_table(reference, path).await?;
        LookupTable::from_batch(&batch)
    }

    /// Retrieves an object and detects its shape.
    async fn load(&self, reference: &ObjectReference) -> Result<DownholeObject> {
        let definition = self.fetch_object(reference).await?;
        Ok(DownholeObject::new(reference.clone(), definition))
    }

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}
