//! Query surface for the presentation layer.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;

use crate::clustering::{LabeledTable, LinkageMethod};
use crate::config::PipelineConfig;
use crate::error::{Result, SimError};
use crate::pipeline::Pipeline;
use crate::source::{DataSource, Dataset};
use crate::utils::arrow::{filter_rows, i64_values, string_values};

/// States offered for selection
#[must_use]
pub fn available_regions(config: &PipelineConfig) -> &[String] {
    &config.regions
}

/// Years offered for selection
#[must_use]
pub fn available_years(config: &PipelineConfig) -> &[i32] {
    &config.years
}

/// Table published under `name`: `SIM`, `CNES` or `REGIONS`
///
/// Tables cover the configured regions and years.
pub fn dataset_by_name<S: DataSource>(pipeline: &Pipeline<S>, name: &str) -> Result<RecordBatch> {
    let config = pipeline.config();
    if name.trim().eq_ignore_ascii_case(crate::pipeline::REGIONS_DATASET) {
        return pipeline.region_table(&config.regions, &config.years);
    }
    let dataset: Dataset = name.parse().map_err(|_| {
        SimError::InvalidInput(format!(
            "Unknown dataset: {name} (available datasets are SIM, CNES and REGIONS)"
        ))
    })?;
    pipeline.acquire_default(dataset)
}

/// Column names of `table`, in schema order
#[must_use]
pub fn column_names(table: &RecordBatch) -> Vec<String> {
    table
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// Parse a comma-separated list of distance thresholds
///
/// Tokens that are not finite numbers are dropped.
#[must_use]
pub fn parse_thresholds(text: &str) -> Vec<f64> {
    text.split(',')
        .filter_map(|token| token.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .collect()
}

/// Parse a linkage method name or UI label such as `"Ward (minimum variance)"`
pub fn parse_linkage_method(label: &str) -> Result<LinkageMethod> {
    label.parse()
}

/// Keep the rows whose `state` is in `regions` and whose `year` is in `years`
///
/// Narrows a table acquired for a broader selection. Rows with a missing state
/// or year are dropped.
pub fn filter_selection(table: &RecordBatch, regions: &[String], years: &[i32]) -> Result<RecordBatch> {
    let regions: FxHashSet<String> = regions.iter().map(|r| r.trim().to_uppercase()).collect();
    let years: FxHashSet<i64> = years.iter().map(|&y| i64::from(y)).collect();

    let states = string_values(table, "state")?;
    let row_years = i64_values(table, "year")?;
    let mask: Vec<bool> = states
        .iter()
        .zip(&row_years)
        .map(|(state, year)| {
            state.as_ref().is_some_and(|s| regions.contains(s))
                && year.is_some_and(|y| years.contains(&y))
        })
        .collect();
    filter_rows(table, &mask)
}

/// Last applied labeling, `None` when none exists
pub fn load_labeled(path: &Path) -> Result<Option<LabeledTable>> {
    crate::clustering::load_labeled(path)
}
