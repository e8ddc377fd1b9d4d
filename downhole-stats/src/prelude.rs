//! Prelude for commonly used types and traits in downhole-stats.

pub use crate::chart::{histogram, violin, ChartDescription, ChartSeries};
pub use crate::config::EngineConfig;
pub use crate::error::{DownholeError, ErrorContext, Result};
pub use crate::gaps::{analyze_gaps, GapReport};
pub use crate::logging::LogConfig;
pub use crate::object::{DownholeObject, ObjectReference, ObjectShape};
pub use crate::response::ToolResponse;
pub use crate::service::DownholeAnalysis;
pub use crate::source::{InMemorySource, ObjectSource};
pub use crate::stats::{
    categorical_summary, interval_statistics, multi_attribute_statistics, statistics_by_hole,
    IntervalStatistics,
};
pub use crate::table::{build_interval_table, BuildReport, IntervalTable};
