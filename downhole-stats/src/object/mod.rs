//! Downhole object definitions and shape detection.
//!
//! A retrieved object arrives as a JSON structural dictionary. Two layouts
//! carry interval data:
//!
//! - **Downhole collection**: several named interval collections under
//!   `collections[]`, each with a `from_to` block and a run-length encoded
//!   `holes` mapping into the shared `location.hole_id` lookup.
//! - **Downhole intervals**: a single implicit interval set with `from_to`,
//!   root-level `attributes[]`, and a categorical `hole_id` column.
//!
//! [`ObjectShape`] is resolved once from the `schema` identifier; everything
//! downstream branches on it instead of re-inspecting the dictionary.

mod reference;

pub use reference::ObjectReference;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DownholeError, Result};

/// Name of the pseudo-collection presented for flat interval objects.
pub const FLAT_COLLECTION_NAME: &str = "intervals";

/// The layout of a downhole object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectShape {
    /// Multiple named interval collections sharing a hole-id lookup.
    #[serde(rename = "downhole-collection")]
    NestedCollection,
    /// A single implicit interval set with root-level attributes.
    #[serde(rename = "downhole-intervals")]
    FlatIntervals,
    /// Anything else.
    Unknown,
}

impl ObjectShape {
    /// Classifies a schema identifier by substring.
    pub fn from_schema(schema: &str) -> Self {
        if schema.contains("downhole-collection") {
            Self::NestedCollection
        } else if schema.contains("downhole-intervals") {
            Self::FlatIntervals
        } else {
            Self::Unknown
        }
    }

    /// Returns the schema-style name of this shape.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NestedCollection => "downhole-collection",
            Self::FlatIntervals => "downhole-intervals",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ObjectShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an attribute's values are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Integer keys resolved through a lookup table.
    Categorical,
    /// Raw floating point values.
    Continuous,
    /// Neither a lookup table nor a value array.
    Unsupported,
}

impl AttributeKind {
    /// Classifies an attribute definition.
    ///
    /// A categorical attribute also exposes `values` (its key array), so the
    /// `table` check has to come first.
    pub fn classify(attribute: &Value) -> Self {
        if attribute.get("table").is_some() {
            Self::Categorical
        } else if attribute.get("values").is_some() {
            Self::Continuous
        } else {
            Self::Unsupported
        }
    }
}

/// Name and kind of one declared attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
}

/// What kind of interval set a collection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// A nested collection with a `from_to` block.
    IntervalTable,
    /// The synthesized collection of a flat intervals object.
    DownholeIntervals,
    /// A nested collection without interval data.
    Unknown,
}

/// Uniform description of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub attributes: Vec<AttributeInfo>,
}

/// Summary of a flat intervals object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalsInfo {
    pub interval_count: u64,
    pub unique_hole_count: u64,
    pub is_composited: bool,
    pub attributes: Vec<AttributeInfo>,
}

/// A retrieved object definition together with its resolved shape.
#[derive(Debug, Clone)]
pub struct DownholeObject {
    reference: ObjectReference,
    definition: Value,
    shape: ObjectShape,
}

impl DownholeObject {
    /// Wraps a structural dictionary, detecting its shape.
    pub fn new(reference: ObjectReference, definition: Value) -> Self {
        let shape = ObjectShape::from_schema(schema_of(&definition));
        Self {
            reference,
            definition,
            shape,
        }
    }

    /// Returns the reference the object was retrieved with.
    pub fn reference(&self) -> &ObjectReference {
        &self.reference
    }

    /// Returns the raw structural dictionary.
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    /// Returns the detected shape.
    pub fn shape(&self) -> ObjectShape {
        self.shape
    }

    /// Returns the declared schema identifier.
    pub fn schema(&self) -> &str {
        schema_of(&self.definition)
    }

    /// Returns the object's display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.definition.get("name").and_then(Value::as_str)
    }

    /// Fails with an unsupported-object-type error unless the shape is known.
    pub fn ensure_supported(&self) -> Result<ObjectShape> {
        match self.shape {
            ObjectShape::Unknown => Err(DownholeError::UnsupportedObjectType {
                schema: self.schema().to_string(),
            }),
            shape => Ok(shape),
        }
    }

    /// Lists collections uniformly for either shape.
    pub fn collections(&self) -> Result<Vec<CollectionInfo>> {
        match self.ensure_supported()? {
            ObjectShape::FlatIntervals => Ok(vec![CollectionInfo {
                name: FLAT_COLLECTION_NAME.to_string(),
                kind: CollectionKind::DownholeIntervals,
                attributes: describe_attributes(self.root_attributes()),
            }]),
            _ => Ok(self
                .raw_collections()
                .iter()
                .map(|collection| CollectionInfo {
                    name: collection_name(collection).unwrap_or_default().to_string(),
                    kind: if collection.get("from_to").is_some() {
                        CollectionKind::IntervalTable
                    } else {
                        CollectionKind::Unknown
                    },
                    attributes: describe_attributes(collection_attributes(collection)),
                })
                .collect()),
        }
    }

    /// Number of holes declared by a nested collection's location block.
    pub fn hole_count(&self) -> u64 {
        self.definition
            .pointer("/location/coordinates/length")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Summarizes a flat intervals object.
    pub fn intervals_info(&self) -> IntervalsInfo {
        IntervalsInfo {
            interval_count: self
                .definition
                .pointer("/from_to/intervals/start_and_end/length")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            unique_hole_count: self
                .definition
                .pointer("/hole_id/table/length")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            is_composited: self
                .definition
                .get("is_composited")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            attributes: describe_attributes(self.root_attributes()),
        }
    }

    /// Finds a nested collection by name, returning its index and definition.
    pub(crate) fn find_collection(&self, name: &str) -> Result<(usize, &Value)> {
        let collections = self.raw_collections();
        collections
            .iter()
            .enumerate()
            .find(|(_, collection)| collection_name(collection) == Some(name))
            .ok_or_else(|| {
                DownholeError::not_found(
                    "Collection",
                    name,
                    collections
                        .iter()
                        .map(|c| collection_name(c).unwrap_or_default().to_string()),
                )
            })
    }

    pub(crate) fn root_attributes(&self) -> &[Value] {
        self.definition
            .get("attributes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn raw_collections(&self) -> &[Value] {
        self.definition
            .get("collections")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Declared attributes of a nested collection.
pub(crate) fn collection_attributes(collection: &Value) -> &[Value] {
    collection
        .pointer("/from_to/attributes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Name of an attribute, or `attr_<index>` when it has none.
pub(crate) fn attribute_name(attribute: &Value, index: usize) -> String {
    attribute
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("attr_{index}"))
}

fn describe_attributes(attributes: &[Value]) -> Vec<AttributeInfo> {
    attributes
        .iter()
        .enumerate()
        .map(|(index, attribute)| AttributeInfo {
            name: attribute_name(attribute, index),
            kind: AttributeKind::classify(attribute),
        })
        .collect()
}

fn collection_name(collection: &Value) -> Option<&str> {
    collection.get("name").and_then(Value::as_str)
}

fn schema_of(definition: &Value) -> &str {
    definition
        .get("schema")
        .and_then(Value::as_str)
        .unwrap_or_default()
}
