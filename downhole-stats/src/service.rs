//! The analysis service exposed to the tool layer.
//!
//! Every call retrieves the object fresh, builds the interval table, runs one
//! analysis and returns a [`ToolResponse`]. Nothing is cached between calls.
//! Floats in payloads are rounded here; the core functions never round.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::chart::{histogram, violin, ChartDescription, HistogramMetadata, ViolinMetadata};
use crate::config::EngineConfig;
use crate::error::{DownholeError, ErrorContext, Result};
use crate::gaps::{analyze_gaps, GapReport};
use crate::object::{CollectionInfo, DownholeObject, IntervalsInfo, ObjectReference, ObjectShape};
use crate::response::ToolResponse;
use crate::source::ObjectSource;
use crate::stats::{
    categorical_summary, interval_statistics, multi_attribute_statistics, round_to,
    statistics_by_hole, summarize_holes, BatchStatus, CategoricalSummary, HoleStatistics,
    HoleSummary, IntervalStatistics,
};
use crate::table::{BuildReport, SkippedAttribute, TableBuilder, TablePreview};

/// Decimals kept for statistics.
pub const STATS_DECIMALS: i32 = 6;
/// Decimals kept for gap figures.
pub const GAP_DECIMALS: i32 = 4;
/// Decimals kept for categorical fractions.
pub const FRACTION_DECIMALS: i32 = 4;

#[derive(Debug, Clone, Serialize)]
pub struct CollectionsPayload {
    pub object_name: Option<String>,
    pub schema: String,
    pub shape: ObjectShape,
    /// Declared hole count of a nested collection object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_count: Option<u64>,
    pub collections: Vec<CollectionInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntervalAttributesPayload {
    pub object_name: Option<String>,
    #[serde(flatten)]
    pub info: IntervalsInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsPayload {
    pub collection: String,
    #[serde(flatten)]
    pub statistics: IntervalStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoleStatisticsPayload {
    pub collection: String,
    pub column: String,
    pub holes: Vec<HoleStatistics>,
    pub summary: HoleSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct GapPayload {
    pub collection: String,
    #[serde(flatten)]
    pub report: GapReport,
    /// True when `gaps` lists fewer gaps than `total_gap_count`.
    pub gap_details_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewPayload {
    pub collection: String,
    #[serde(flatten)]
    pub preview: TablePreview,
    pub skipped_attributes: Vec<SkippedAttribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiAttributePayload {
    pub collection: String,
    pub statistics: Vec<IntervalStatistics>,
    pub errors: Vec<String>,
    pub available_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoricalPayload {
    pub collection: String,
    #[serde(flatten)]
    pub summary: CategoricalSummary,
}

/// Interval analysis over objects from an [`ObjectSource`].
///
/// # Examples
///
/// ```rust,ignore
/// use downhole_stats::prelude::*;
///
/// # async fn example(reference: ObjectReference) {
/// let analysis = DownholeAnalysis::new(InMemorySource::new());
/// let response = analysis.interval_statistics(&reference, "assay", "Au").await;
/// println!("{}", response.to_json().unwrap());
/// # }
/// ```
#[derive(Debug)]
pub struct DownholeAnalysis<S> {
    source: Arc<S>,
    config: EngineConfig,
}

impl<S> Clone for DownholeAnalysis<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
        }
    }
}

impl<S: ObjectSource> DownholeAnalysis<S> {
    pub fn new(source: S) -> Self {
        Self::from_arc(Arc::new(source))
    }

    /// Shares an existing source.
    pub fn from_arc(source: Arc<S>) -> Self {
        Self {
            source,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Lists the collections of either object shape.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn list_collections(
        &self,
        reference: &ObjectReference,
    ) -> ToolResponse<CollectionsPayload> {
        respond("list_collections", self.run_list_collections(reference).await)
    }

    /// Describes the attributes of a flat intervals object.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn list_interval_attributes(
        &self,
        reference: &ObjectReference,
    ) -> ToolResponse<IntervalAttributesPayload> {
        respond(
            "list_interval_attributes",
            self.run_list_interval_attributes(reference).await,
        )
    }

    /// Length-weighted statistics of one attribute.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn interval_statistics(
        &self,
        reference: &ObjectReference,
        collection: &str,
        column: &str,
    ) -> ToolResponse<StatisticsPayload> {
        respond(
            "interval_statistics",
            self.run_interval_statistics(reference, collection, column)
                .await,
        )
    }

    /// Per-hole statistics of one attribute with a summary of standout holes.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn statistics_by_hole(
        &self,
        reference: &ObjectReference,
        collection: &str,
        column: &str,
    ) -> ToolResponse<HoleStatisticsPayload> {
        respond(
            "statistics_by_hole",
            self.run_statistics_by_hole(reference, collection, column)
                .await,
        )
    }

    /// Gaps between consecutive intervals, with details capped by configuration.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn gap_analysis(
        &self,
        reference: &ObjectReference,
        collection: &str,
    ) -> ToolResponse<GapPayload> {
        respond(
            "gap_analysis",
            self.run_gap_analysis(reference, collection).await,
        )
    }

    /// First rows and column summaries of the built table.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn interval_preview(
        &self,
        reference: &ObjectReference,
        collection: &str,
        max_rows: Option<usize>,
    ) -> ToolResponse<PreviewPayload> {
        respond(
            "interval_preview",
            self.run_interval_preview(reference, collection, max_rows)
                .await,
        )
    }

    /// Statistics for several attributes; failing columns make the call partial.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn multi_attribute_statistics(
        &self,
        reference: &ObjectReference,
        collection: &str,
        columns: &[String],
    ) -> ToolResponse<MultiAttributePayload> {
        let report = match self.build(reference, collection).await {
            Ok(report) => report,
            Err(e) => return respond("multi_attribute_statistics", Err(e)),
        };

        let batch = multi_attribute_statistics(&report.table, columns);
        let payload = MultiAttributePayload {
            available_columns: report.table.column_names(),
            collection: report.collection,
            statistics: batch
                .statistics
                .iter()
                .map(|s| s.rounded(STATS_DECIMALS))
                .collect(),
            errors: batch.errors,
        };
        match batch.status {
            BatchStatus::Success => ToolResponse::Success(payload),
            BatchStatus::Partial => ToolResponse::Partial(payload),
        }
    }

    /// Value counts and per-hole coverage of a categorical attribute.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn categorical_summary(
        &self,
        reference: &ObjectReference,
        collection: &str,
        column: &str,
        max_categories: Option<usize>,
    ) -> ToolResponse<CategoricalPayload> {
        respond(
            "categorical_summary",
            self.run_categorical_summary(reference, collection, column, max_categories)
                .await,
        )
    }

    /// Count and length-weighted histogram data.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn histogram(
        &self,
        reference: &ObjectReference,
        collection: &str,
        column: &str,
        bins: Option<usize>,
    ) -> ToolResponse<ChartDescription<HistogramMetadata>> {
        let bins = bins.unwrap_or(self.config.histogram_bins);
        let result = match self.build(reference, collection).await {
            Ok(report) => histogram(&report.table, column, bins),
            Err(e) => Err(e),
        };
        respond("histogram", result)
    }

    /// Distribution data, optionally grouped by another column.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn violin(
        &self,
        reference: &ObjectReference,
        collection: &str,
        column: &str,
        group_by: Option<&str>,
        max_groups: Option<usize>,
    ) -> ToolResponse<ChartDescription<ViolinMetadata>> {
        let max_groups = max_groups.unwrap_or(self.config.max_violin_groups);
        let result = match self.build(reference, collection).await {
            Ok(report) => violin(&report.table, column, group_by, max_groups),
            Err(e) => Err(e),
        };
        respond("violin", result)
    }

    /// Retrieves the object and builds the table for one collection.
    pub async fn build(
        &self,
        reference: &ObjectReference,
        collection: &str,
    ) -> Result<BuildReport> {
        let object = self.load(reference).await?;
        TableBuilder::new(self.source.as_ref())
            .with_log_config(self.config.log.clone())
            .build(&object, collection)
            .await
    }

    async fn load(&self, reference: &ObjectReference) -> Result<DownholeObject> {
        debug!(source = %self.source.description(), "Loading object");
        self.source
            .load(reference)
            .await
            .with_context(|| format!("Loading object {reference}"))
    }

    async fn run_list_collections(
        &self,
        reference: &ObjectReference,
    ) -> Result<CollectionsPayload> {
        let object = self.load(reference).await?;
        let collections = object.collections()?;
        Ok(CollectionsPayload {
            object_name: object.name().map(str::to_string),
            schema: object.schema().to_string(),
            shape: object.shape(),
            hole_count: (object.shape() == ObjectShape::NestedCollection)
                .then(|| object.hole_count()),
            collections,
        })
    }

    async fn run_list_interval_attributes(
        &self,
        reference: &ObjectReference,
    ) -> Result<IntervalAttributesPayload> {
        let object = self.load(reference).await?;
        match object.ensure_supported()? {
            ObjectShape::FlatIntervals => Ok(IntervalAttributesPayload {
                object_name: object.name().map(str::to_string),
                info: object.intervals_info(),
            }),
            _ => Err(DownholeError::InvalidArgument(
                "object is a downhole collection; use list_collections instead".to_string(),
            )),
        }
    }

    async fn run_interval_statistics(
        &self,
        reference: &ObjectReference,
        collection: &str,
        column: &str,
    ) -> Result<StatisticsPayload> {
        let report = self.build(reference, collection).await?;
        let statistics = interval_statistics(&report.table, column)?;
        Ok(StatisticsPayload {
            collection: report.collection,
            statistics: statistics.rounded(STATS_DECIMALS),
        })
    }

    async fn run_statistics_by_hole(
        &self,
        reference: &ObjectReference,
        collection: &str,
        column: &str,
    ) -> Result<HoleStatisticsPayload> {
        let report = self.build(reference, collection).await?;
        let holes = statistics_by_hole(&report.table, column, &self.config).await?;
        Ok(HoleStatisticsPayload {
            collection: report.collection,
            column: column.to_string(),
            summary: summarize_holes(&holes),
            holes: holes.iter().map(|h| h.rounded(STATS_DECIMALS)).collect(),
        })
    }

    async fn run_gap_analysis(
        &self,
        reference: &ObjectReference,
        collection: &str,
    ) -> Result<GapPayload> {
        let report = self.build(reference, collection).await?;
        let mut gaps = analyze_gaps(&report.table).rounded(GAP_DECIMALS);
        let limit = self.config.gap_detail_limit;
        let gap_details_truncated = gaps.gaps.len() > limit;
        gaps.gaps.truncate(limit);
        Ok(GapPayload {
            collection: report.collection,
            message: (gaps.total_gap_count == 0).then(|| "No gaps found".to_string()),
            report: gaps,
            gap_details_truncated,
        })
    }

    async fn run_interval_preview(
        &self,
        reference: &ObjectReference,
        collection: &str,
        max_rows: Option<usize>,
    ) -> Result<PreviewPayload> {
        let report = self.build(reference, collection).await?;
        let rows = max_rows.unwrap_or(self.config.preview_rows);
        Ok(PreviewPayload {
            preview: TablePreview::build(&report.table, rows)?,
            collection: report.collection,
            skipped_attributes: report.skipped,
        })
    }

    async fn run_categorical_summary(
        &self,
        reference: &ObjectReference,
        collection: &str,
        column: &str,
        max_categories: Option<usize>,
    ) -> Result<CategoricalPayload> {
        let report = self.build(reference, collection).await?;
        let limit = max_categories.unwrap_or(self.config.max_categories);
        let mut summary = categorical_summary(&report.table, column, limit)?;
        for value in &mut summary.value_counts {
            value.fraction = round_to(value.fraction, FRACTION_DECIMALS);
            value.total_length = round_to(value.total_length, STATS_DECIMALS);
        }
        Ok(CategoricalPayload {
            collection: report.collection,
            summary,
        })
    }
}

fn respond<T>(operation: &str, result: Result<T>) -> ToolResponse<T> {
    match &result {
        Err(e) if e.is_caller_error() => {
            info!(operation, error = %e, kind = e.kind(), "Analysis call rejected")
        }
        Err(e) => warn!(operation, error = %e, kind = e.kind(), "Analysis call failed"),
        Ok(_) => {}
    }
    result.into()
}
