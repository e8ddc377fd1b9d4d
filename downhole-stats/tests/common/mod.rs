//! Object fixtures shared by the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use downhole_stats::object::ObjectReference;
use downhole_stats::source::InMemorySource;
use serde_json::json;

pub const NESTED_SCHEMA: &str = "/objects/downhole-collection/1.3.0/downhole-collection.schema.json";
pub const FLAT_SCHEMA: &str = "/objects/downhole-intervals/1.0.1/downhole-intervals.schema.json";

pub fn bounds(from: &[f64], to: &[f64]) -> RecordBatch {
    RecordBatch::try_new(
        Arc::new(Schema::new(vec![
            Field::new("from", DataType::Float64, false),
            Field::new("to", DataType::Float64, false),
        ])),
        vec![
            Arc::new(Float64Array::from(from.to_vec())) as ArrayRef,
            Arc::new(Float64Array::from(to.to_vec())),
        ],
    )
    .unwrap()
}

pub fn lookup(entries: &[(i64, &str)]) -> RecordBatch {
    RecordBatch::try_new(
        Arc::new(Schema::new(vec![
            Field::new("key", DataType::Int64, false),
            Field::new("value", DataType::Utf8, false),
        ])),
        vec![
            Arc::new(Int64Array::from_iter_values(entries.iter().map(|(k, _)| *k))) as ArrayRef,
            Arc::new(StringArray::from_iter_values(entries.iter().map(|(_, v)| *v))),
        ],
    )
    .unwrap()
}

pub fn hole_runs(runs: &[(i64, i64)]) -> RecordBatch {
    RecordBatch::try_new(
        Arc::new(Schema::new(vec![
            Field::new("hole_index", DataType::Int64, false),
            Field::new("count", DataType::Int64, false),
        ])),
        vec![
            Arc::new(Int64Array::from_iter_values(runs.iter().map(|(h, _)| *h))) as ArrayRef,
            Arc::new(Int64Array::from_iter_values(runs.iter().map(|(_, c)| *c))),
        ],
    )
    .unwrap()
}

/// A nested collection object with one `assay` collection.
///
/// | hole  | from | to | Au  | lith  |
/// |-------|------|----|-----|-------|
/// | DH001 | 0    | 1  | 1   | qtz   |
/// | DH001 | 1    | 2  | 2   | qtz   |
/// | DH001 | 2    | 4  | 3   | bas   |
/// | DH002 | 0    | 1  | 0.5 | qtz   |
/// | DH002 | 2    | 3  | 1.5 | (key 9, unresolved) |
///
/// `Ag` is declared but has no data.
pub async fn nested_object(source: &InMemorySource) -> ObjectReference {
    let reference = ObjectReference::random();
    source
        .insert_object(
            &reference,
            json!({
                "schema": NESTED_SCHEMA,
                "name": "Drilling 2024",
                "location": {
                    "coordinates": {"length": 2},
                    "hole_id": {"table": {"length": 2}}
                },
                "collections": [
                    {
                        "name": "assay",
                        "holes": {"length": 2},
                        "from_to": {
                            "intervals": {"start_and_end": {"length": 5}},
                            "attributes": [
                                {"name": "Au", "values": {"length": 5}},
                                {"name": "lith", "table": {"length": 2}, "values": {"length": 5}},
                                {"name": "Ag", "values": {"length": 5}}
                            ]
                        }
                    },
                    {"name": "collar_notes"}
                ]
            }),
        )
        .await;

    source
        .insert_table(
            &reference,
            "collections[0].from_to.intervals.start_and_end",
            bounds(&[0.0, 1.0, 2.0, 0.0, 2.0], &[1.0, 2.0, 4.0, 1.0, 3.0]),
        )
        .await;
    source
        .insert_table(&reference, "collections[0].holes", hole_runs(&[(0, 3), (1, 2)]))
        .await;
    source
        .insert_table(
            &reference,
            "location.hole_id.table",
            lookup(&[(0, "DH001"), (1, "DH002")]),
        )
        .await;
    source
        .insert_column(
            &reference,
            "collections[0].from_to.attributes[0].values",
            "values",
            Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0, 0.5, 1.5])),
        )
        .await
        .unwrap();
    source
        .insert_table(
            &reference,
            "collections[0].from_to.attributes[1].table",
            lookup(&[(1, "qtz"), (2, "bas")]),
        )
        .await;
    source
        .insert_column(
            &reference,
            "collections[0].from_to.attributes[1].values",
            "key",
            Arc::new(Int64Array::from(vec![1, 1, 2, 1, 9])),
        )
        .await
        .unwrap();

    reference
}

/// A flat intervals object with `holes` holes of two contiguous intervals each.
///
/// Hole `i` is named `H{i:03}`; `Cu` for its intervals is `i` and `i + 0.5`.
pub async fn flat_object(source: &InMemorySource, holes: usize) -> ObjectReference {
    let reference = ObjectReference::random();
    let rows = holes * 2;
    source
        .insert_object(
            &reference,
            json!({
                "schema": FLAT_SCHEMA,
                "name": "Composites",
                "is_composited": true,
                "from_to": {"intervals": {"start_and_end": {"length": rows}}},
                "hole_id": {"table": {"length": holes}, "values": {"length": rows}},
                "attributes": [{"name": "Cu", "values": {"length": rows}}]
            }),
        )
        .await;

    let from: Vec<f64> = (0..rows).map(|r| (r % 2) as f64 * 2.0).collect();
    let to: Vec<f64> = from.iter().map(|f| f + 2.0).collect();
    source
        .insert_table(&reference, "from_to.intervals.start_and_end", bounds(&from, &to))
        .await;

    let names: Vec<String> = (0..holes).map(|h| format!("H{h:03}")).collect();
    let entries: Vec<(i64, &str)> = names
        .iter()
        .enumerate()
        .map(|(h, name)| (h as i64, name.as_str()))
        .collect();
    source
        .insert_table(&reference, "hole_id.table", lookup(&entries))
        .await;
    source
        .insert_column(
            &reference,
            "hole_id.values",
            "key",
            Arc::new(Int64Array::from_iter_values((0..rows).map(|r| (r / 2) as i64))),
        )
        .await
        .unwrap();
    source
        .insert_column(
            &reference,
            "attributes[0].values",
            "values",
            Arc::new(Float64Array::from_iter_values(
                (0..rows).map(|r| (r / 2) as f64 + (r % 2) as f64 * 0.5),
            )),
        )
        .await
        .unwrap();

    reference
}
