//! Engine configuration.
//!
//! [`EngineConfig`] carries the defaults the analysis service falls back to
//! when a caller does not specify a value, plus the DataFusion session settings
//! used for grouped aggregation.

use datafusion::execution::context::{SessionConfig, SessionContext};
use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;

/// Configuration for the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Batch size for query execution
    pub batch_size: usize,
    /// Target number of partitions for parallel execution
    pub target_partitions: usize,
    /// Default number of histogram bins
    pub histogram_bins: usize,
    /// Default maximum number of violin groups
    pub max_violin_groups: usize,
    /// Default maximum number of categories kept by categorical summaries
    pub max_categories: usize,
    /// Number of individual gaps returned by the gap analysis service call
    pub gap_detail_limit: usize,
    /// Default number of rows returned by the table preview
    pub preview_rows: usize,
    /// Logging behaviour
    #[serde(skip)]
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            target_partitions: num_cpus::get().max(1),
            histogram_bins: 20,
            max_violin_groups: 50,
            max_categories: 100,
            gap_detail_limit: 100,
            preview_rows: 50,
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Sets the default number of histogram bins.
    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins;
        self
    }

    /// Sets the default maximum number of violin groups.
    pub fn with_max_violin_groups(mut self, max_groups: usize) -> Self {
        self.max_violin_groups = max_groups;
        self
    }

    /// Sets the default category cap for categorical summaries.
    pub fn with_max_categories(mut self, max_categories: usize) -> Self {
        self.max_categories = max_categories;
        self
    }

    /// Sets how many individual gaps the gap analysis call returns.
    pub fn with_gap_detail_limit(mut self, limit: usize) -> Self {
        self.gap_detail_limit = limit;
        self
    }

    /// Sets the default preview row count.
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Sets the logging configuration.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Creates a DataFusion session for grouped aggregation.
    pub fn session_context(&self) -> SessionContext {
        let session_config = SessionConfig::new()
            .with_batch_size(self.batch_size.max(1))
            .with_target_partitions(self.target_partitions.max(1));
        SessionContext::new_with_config(session_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.histogram_bins, 20);
        assert_eq!(config.max_violin_groups, 50);
        assert_eq!(config.max_categories, 100);
        assert_eq!(config.gap_detail_limit, 100);
        assert_eq!(config.preview_rows, 50);
        assert!(config.target_partitions >= 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"histogram_bins": 8, "gap_detail_limit": 10}"#).unwrap();
        assert_eq!(config.histogram_bins, 8);
        assert_eq!(config.gap_detail_limit, 10);
        assert_eq!(config.max_violin_groups, 50);
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::default()
            .with_histogram_bins(4)
            .with_max_violin_groups(5)
            .with_max_categories(3)
            .with_preview_rows(7);
        assert_eq!(config.histogram_bins, 4);
        assert_eq!(config.max_violin_groups, 5);
        assert_eq!(config.max_categories, 3);
        assert_eq!(config.preview_rows, 7);
    }

    #[test]
    fn test_session_context_respects_batch_size() {
        let config = EngineConfig {
            batch_size: 1024,
            ..Default::default()
        };
        let ctx = config.session_context();
        assert_eq!(ctx.copied_config().batch_size(), 1024);
    }
}
