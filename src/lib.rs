//! Suicide mortality analytics over Brazilian health registries: a cached
//! acquisition and feature-engineering pipeline for mortality (SIM) and
//! facility (CNES) data, per-municipality rate aggregation, and hierarchical
//! clustering of the enriched records.

pub mod aggregation;
pub mod analysis;
pub mod cache;
pub mod clustering;
pub mod config;
pub mod error;
pub mod features;
pub mod lookup;
pub mod pipeline;
pub mod query;
pub mod schemas;
pub mod source;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use cache::{CacheKey, CacheStore, CacheTier};
pub use config::{HolidayConfig, PipelineConfig};
pub use error::{Result, SimError};
pub use pipeline::Pipeline;
pub use source::{DataSource, Dataset, ParquetDirectorySource};

// Arrow types
pub use arrow::datatypes::Schema as ArrowSchema;
pub use arrow::record_batch::RecordBatch;

// Aggregation
pub use aggregation::{RegionAggregate, RegionPopulation, aggregate_regions};

// Clustering
pub use clustering::{
    EncodedTable, EncodingSchema, EvaluationReport, EvaluationRow, LabeledTable, LinkageMethod,
    LinkageTree, apply_threshold, build_tree, evaluate,
};
