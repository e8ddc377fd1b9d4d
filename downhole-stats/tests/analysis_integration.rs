//! End-to-end tests of `DownholeAnalysis` over in-memory objects.

mod common;

use downhole_stats::chart::ChartSeries;
use downhole_stats::config::EngineConfig;
use downhole_stats::object::{CollectionKind, ObjectReference, ObjectShape};
use downhole_stats::prelude::*;
use downhole_stats::table::SkipReason;
use serde_json::json;

use common::{flat_object, nested_object};

fn analysis() -> DownholeAnalysis<InMemorySource> {
    DownholeAnalysis::new(InMemorySource::new())
}

#[tokio::test]
async fn test_list_collections_nested() {
    let analysis = analysis();
    let reference = nested_object(analysis.source()).await;

    let response = analysis.list_collections(&reference).await;
    let payload = response.payload().unwrap();
    assert_eq!(payload.shape, ObjectShape::NestedCollection);
    assert_eq!(payload.object_name.as_deref(), Some("Drilling 2024"));
    assert_eq!(payload.hole_count, Some(2));
    assert_eq!(payload.collections.len(), 2);
    assert_eq!(payload.collections[0].attributes.len(), 3);
    assert_eq!(payload.collections[1].kind, CollectionKind::Unknown);

    let json = response.to_json().unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["collections"][0]["attributes"][1]["type"], "categorical");
}

#[tokio::test]
async fn test_list_collections_flat() {
    let analysis = analysis();
    let reference = flat_object(analysis.source(), 3).await;

    let payload = analysis
        .list_collections(&reference)
        .await
        .into_payload()
        .unwrap();
    assert_eq!(payload.shape, ObjectShape::FlatIntervals);
    assert_eq!(payload.hole_count, None);
    assert_eq!(payload.collections.len(), 1);
    assert_eq!(payload.collections[0].name, "intervals");
}

#[tokio::test]
async fn test_list_interval_attributes() {
    let analysis = analysis();
    let flat = flat_object(analysis.source(), 3).await;
    let nested = nested_object(analysis.source()).await;

    let payload = analysis
        .list_interval_attributes(&flat)
        .await
        .into_payload()
        .unwrap();
    assert_eq!(payload.info.interval_count, 6);
    assert_eq!(payload.info.unique_hole_count, 3);
    assert!(payload.info.is_composited);

    let response = analysis.list_interval_attributes(&nested).await;
    assert!(response.is_error());
    assert!(response.error_message().unwrap().contains("list_collections"));
}

#[tokio::test]
async fn test_unsupported_and_missing_objects() {
    let analysis = analysis();
    let pointset = ObjectReference::random();
    analysis
        .source()
        .insert_object(&pointset, json!({"schema": "/objects/pointset/1.2.0/pointset.schema.json"}))
        .await;

    let json = analysis
        .interval_statistics(&pointset, "assay", "Au")
        .await
        .to_json()
        .unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error_type"], "unsupported_object_type");

    let missing = analysis.list_collections(&ObjectReference::random()).await;
    assert!(missing.error_message().unwrap().contains("Loading object"));
}

#[tokio::test]
async fn test_interval_statistics_nested() {
    let analysis = analysis();
    let reference = nested_object(analysis.source()).await;

    let payload = analysis
        .interval_statistics(&reference, "assay", "Au")
        .await
        .into_payload()
        .unwrap();
    let stats = payload.statistics;
    assert_eq!(stats.accumulation, 11.0);
    assert_eq!(stats.total_length, 6.0);
    assert_eq!(stats.length_weighted_mean, 1.833333);
    assert_eq!(stats.count, 5);
    assert_eq!(stats.data_quality.invalid_rows, 0);
}

#[tokio::test]
async fn test_collection_not_found_lists_names() {
    let analysis = analysis();
    let reference = nested_object(analysis.source()).await;

    let response = analysis.interval_statistics(&reference, "geotech", "Au").await;
    assert_eq!(
        response.error_message(),
        Some("Collection 'geotech' not found. Available: [assay, collar_notes]")
    );
}

#[tokio::test]
async fn test_statistics_by_hole_nested() {
    let analysis = analysis();
    let reference = nested_object(analysis.source()).await;

    let payload = analysis
        .statistics_by_hole(&reference, "assay", "Au")
        .await
        .into_payload()
        .unwrap();
    assert_eq!(payload.holes.len(), 2);
    assert_eq!(payload.holes[0].hole_id, "DH001");
    assert_eq!(payload.holes[0].length_weighted_mean, Some(2.25));
    assert_eq!(payload.holes[1].length_weighted_mean, Some(1.0));
    assert_eq!(payload.summary.best_by_weighted_mean.as_deref(), Some("DH001"));
    assert_eq!(payload.summary.most_sampled.as_deref(), Some("DH001"));

    let total: f64 = payload.holes.iter().map(|h| h.total_length).sum();
    assert_eq!(total, 6.0);
}

#[tokio::test]
async fn test_gap_analysis() {
    let analysis = analysis();
    let nested = nested_object(analysis.source()).await;
    let flat = flat_object(analysis.source(), 3).await;

    let payload = analysis
        .gap_analysis(&nested, "assay")
        .await
        .into_payload()
        .unwrap();
    assert_eq!(payload.report.total_gap_count, 1);
    assert_eq!(payload.report.gaps[0].hole_id, "DH002");
    assert_eq!(payload.report.holes_without_gaps, 1);
    assert!(!payload.gap_details_truncated);
    assert!(payload.message.is_none());

    let payload = analysis
        .gap_analysis(&flat, "intervals")
        .await
        .into_payload()
        .unwrap();
    assert_eq!(payload.report.total_gap_count, 0);
    assert_eq!(payload.report.holes_without_gaps, 3);
    assert_eq!(payload.message.as_deref(), Some("No gaps found"));
}

#[tokio::test]
async fn test_gap_details_are_capped() {
    let analysis = analysis().with_config(EngineConfig::default().with_gap_detail_limit(0));
    let reference = nested_object(analysis.source()).await;

    let payload = analysis
        .gap_analysis(&reference, "assay")
        .await
        .into_payload()
        .unwrap();
    assert_eq!(payload.report.total_gap_count, 1);
    assert!(payload.report.gaps.is_empty());
    assert!(payload.gap_details_truncated);
}

#[tokio::test]
async fn test_multi_attribute_partial() {
    let analysis = analysis();
    let reference = nested_object(analysis.source()).await;

    let response = analysis
        .multi_attribute_statistics(&reference, "assay", &["Au".to_string(), "Ag".to_string()])
        .await;
    assert!(response.is_partial());

    let payload = response.payload().unwrap();
    assert_eq!(payload.statistics.len(), 1);
    assert_eq!(payload.statistics[0].column, "Au");
    assert_eq!(payload.errors.len(), 1);
    assert!(payload.errors[0].contains("Ag"));
    assert!(payload.available_columns.contains(&"lith".to_string()));
    assert_eq!(response.to_json().unwrap()["status"], "partial");
}

#[tokio::test]
async fn test_categorical_summary_nested() {
    let analysis = analysis();
    let reference = nested_object(analysis.source()).await;

    let payload = analysis
        .categorical_summary(&reference, "assay", "lith", None)
        .await
        .into_payload()
        .unwrap();
    let summary = payload.summary;
    assert_eq!(summary.null_count, 1);
    assert_eq!(summary.value_counts[0].value, "qtz");
    assert_eq!(summary.value_counts[0].fraction, 0.75);
    assert_eq!(summary.value_counts[0].total_length, 3.0);
    assert_eq!(summary.value_counts[1].value, "bas");
    assert_eq!(summary.value_counts[1].total_length, 2.0);
    assert_eq!(summary.by_hole[1].hole_id, "DH002");
    assert_eq!(summary.by_hole[1].null_count, 1);
}

#[tokio::test]
async fn test_preview_reports_skipped_attributes() {
    let analysis = analysis();
    let reference = nested_object(analysis.source()).await;

    let payload = analysis
        .interval_preview(&reference, "assay", Some(2))
        .await
        .into_payload()
        .unwrap();
    assert_eq!(payload.preview.row_count, 5);
    assert_eq!(payload.preview.unique_holes, 2);
    assert_eq!(payload.preview.rows.len(), 2);
    assert_eq!(payload.preview.rows[0]["hole_id"], "DH001");
    assert_eq!(payload.skipped_attributes.len(), 1);
    assert_eq!(payload.skipped_attributes[0].name, "Ag");
    assert!(matches!(
        payload.skipped_attributes[0].reason,
        SkipReason::Retrieval { .. }
    ));
}

#[tokio::test]
async fn test_histogram_and_violin() {
    let analysis = analysis();
    let reference = nested_object(analysis.source()).await;

    let chart = analysis
        .histogram(&reference, "assay", "Au", Some(4))
        .await
        .into_payload()
        .unwrap();
    assert_eq!(chart.metadata.bin_edges.len(), 5);
    assert_eq!(chart.metadata.total_samples, 5);

    let chart = analysis
        .violin(&reference, "assay", "Au", Some("hole_id"), None)
        .await
        .into_payload()
        .unwrap();
    let names: Vec<&str> = chart.series.iter().map(ChartSeries::name).collect();
    assert_eq!(names, vec!["DH001", "DH002"]);
}

#[tokio::test]
async fn test_violin_cap_on_flat_object() {
    let analysis = analysis();
    let reference = flat_object(analysis.source(), 60).await;

    let json = analysis
        .violin(&reference, "intervals", "Cu", Some("hole_id"), Some(50))
        .await
        .to_json()
        .unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error_type"], "cap_exceeded");
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("(60)"));
    assert!(message.contains("50"));

    let chart = analysis
        .violin(&reference, "intervals", "Cu", Some("hole_id"), Some(100))
        .await
        .into_payload()
        .unwrap();
    assert_eq!(chart.series.len(), 60);
}

#[tokio::test]
async fn test_flat_statistics_ignore_collection_name() {
    let analysis = analysis();
    let reference = flat_object(analysis.source(), 3).await;

    let stats = analysis
        .interval_statistics(&reference, "anything", "Cu")
        .await
        .into_payload()
        .unwrap()
        .statistics;
    assert_eq!(stats.length_weighted_mean, 1.25);
    assert_eq!(stats.total_length, 12.0);
}
