//! # downhole-stats - Interval Statistics for Drillhole Data
//!
//! Length-weighted statistics, gap analysis and chart-ready summaries over
//! drillhole ("downhole") sampling intervals, built on Apache Arrow and
//! DataFusion.
//!
//! ## Overview
//!
//! Downhole objects arrive in one of two layouts: a nested collection object
//! holding several named interval sets, or a flat intervals object with a
//! single implicit set. Both are normalized into one canonical
//! [`IntervalTable`](table::IntervalTable) with `hole_id`, `from`, `to` and
//! attribute columns. Categorical attributes are decoded from integer keys
//! through their lookup tables while the table is built.
//!
//! Analyses then run on the table independently:
//!
//! - **Statistics**: length-weighted mean, accumulation, per-hole
//!   aggregation, multi-attribute batches and categorical summaries
//! - **Gaps**: unsampled depth ranges between consecutive intervals
//! - **Charts**: histogram and violin data as library-agnostic descriptions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use downhole_stats::prelude::*;
//!
//! # async fn example(source: InMemorySource, reference: ObjectReference) -> Result<()> {
//! let object = source.load(&reference).await?;
//! let report = build_interval_table(&source, &object, "assay").await?;
//!
//! let stats = interval_statistics(&report.table, "Au")?;
//! println!("Au: {:.3} over {} m", stats.length_weighted_mean, stats.total_length);
//!
//! let gaps = analyze_gaps(&report.table);
//! println!("{} gaps", gaps.total_gap_count);
//! # Ok(())
//! # }
//! ```
//!
//! For tool integrations, [`DownholeAnalysis`](service::DownholeAnalysis)
//! wraps each operation and returns a serializable
//! [`ToolResponse`](response::ToolResponse) instead of an error.
//!
//! ## Architecture
//!
//! - **`object`**: object references, shape detection and collection listing
//! - **`resolver`**: lookup tables and categorical key resolution
//! - **`source`**: the [`ObjectSource`](source::ObjectSource) retrieval trait
//!   and an in-memory implementation
//! - **`table`**: the canonical table, its builder and previews
//! - **`stats`**, **`gaps`**, **`chart`**: the analyses
//! - **`service`** and **`response`**: the tool-layer boundary
//! - **`config`**, **`logging`**, **`error`**: ambient support

pub mod chart;
pub mod config;
pub mod error;
pub mod gaps;
pub mod logging;
pub mod object;
pub mod prelude;
pub mod resolver;
pub mod response;
pub mod service;
pub mod source;
pub mod stats;
pub mod table;
