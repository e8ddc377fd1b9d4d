//! In-memory implementation of [`ObjectSource`].

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{DownholeError, Result};
use crate::object::ObjectReference;

use super::ObjectSource;

type ObjectKey = (Uuid, Uuid);

#[derive(Debug, Clone)]
struct StoredVersion {
    version: String,
    definition: Value,
}

/// An [`ObjectSource`] holding object definitions and tables in memory.
///
/// Useful for:
/// - Testing and development
/// - Embedders that already hold decoded object data
///
/// Tables are shared by every version of an object. Category tables are
/// served from an exact path entry when one was inserted, otherwise they are
/// resolved from `<path>.table` and `<path>.values`.
///
/// # Example
///
/// ```rust,ignore
/// use downhole_stats::source::InMemorySource;
///
/// let source = InMemorySource::new();
/// source.insert_object(&reference, definition).await;
/// source.insert_table(&reference, "from_to.intervals.start_and_end", batch).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    objects: Arc<RwLock<HashMap<ObjectKey, Vec<StoredVersion>>>>,
    tables: Arc<RwLock<HashMap<(ObjectKey, String), RecordBatch>>>,
}

impl InMemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object definition.
    ///
    /// The reference's version is used as the version identifier, or a
    /// sequence number when it has none. The most recent insert is latest.
    pub async fn insert_object(&self, reference: &ObjectReference, definition: Value) {
        let mut objects = self.objects.write().await;
        let versions = objects.entry(key(reference)).or_default();
        let version = reference
            .version
            .clone()
            .unwrap_or_else(|| (versions.len() + 1).to_string());
        versions.push(StoredVersion {
            version,
            definition,
        });
    }

    /// Stores a table at a path.
    pub async fn insert_table(
        &self,
        reference: &ObjectReference,
        path: impl Into<String>,
        batch: RecordBatch,
    ) {
        self.tables
            .write()
            .await
            .insert((key(reference), path.into()), batch);
    }

    /// Stores a single named column as a one-column table.
    pub async fn insert_column(
        &self,
        reference: &ObjectReference,
        path: impl Into<String>,
        name: &str,
        array: ArrayRef,
    ) -> Result<()> {
        let schema = Schema::new(vec![Field::new(name, array.data_type().clone(), true)]);
        let batch = RecordBatch::try_new(Arc::new(schema), vec![array])?;
        self.insert_table(reference, path, batch).await;
        Ok(())
    }

    /// Returns the number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    async fn get_table(&self, reference: &ObjectReference, path: &str) -> Option<RecordBatch> {
        self.tables
            .read()
            .await
            .get(&(key(reference), path.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectSource for InMemorySource {
    #[instrument(skip(self), fields(reference = %reference))]
    async fn fetch_object(&self, reference: &ObjectReference) -> Result<Value> {
        let objects = self.objects.read().await;
        let versions = objects
            .get(&key(reference))
            .ok_or_else(|| DownholeError::retrieval("", format!("object {reference} not found")))?;

        let stored = match reference.version {
            Some(ref version) => versions.iter().find(|v| &v.version == version),
            None => versions.last(),
        };

        stored.map(|v| v.definition.clone()).ok_or_else(|| {
            DownholeError::retrieval("", format!("object {reference} has no such version"))
        })
    }

    async fn fetch_table(&self, reference: &ObjectReference, path: &str) -> Result<RecordBatch> {
        self.get_table(reference, path)
            .await
            .ok_or_else(|| DownholeError::retrieval(path, "no data at path"))
    }

    async fn fetch_category_table(
        &self,
        reference: &ObjectReference,
        path: &str,
    ) -> Result<RecordBatch> {
        if let Some(batch) = self.get_table(reference, path).await {
            return Ok(batch);
        }

        let resolved = crate::resolver::resolve_categorical(self, reference, path).await?;
        let schema = Schema::new(vec![Field::new("value", DataType::Utf8, true)]);
        Ok(RecordBatch::try_new(
            Arc::new(schema),
            vec![resolved.into_array()],
        )?)
    }

    fn description(&self) -> String {
        "in-memory object source".to_string()
    }
}

fn key(reference: &ObjectReference) -> ObjectKey {
    (reference.workspace_id, reference.object_id)
}
