use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use log::{info, warn};
use sim_analytics::analysis::describe_numeric;
use sim_analytics::clustering::{apply_threshold, build_tree, candidate_thresholds, evaluate};
use sim_analytics::config::SOURCE_DIR_ENV;
use sim_analytics::utils::arrow::project_as_strings;
use sim_analytics::{Dataset, LinkageMethod, ParquetDirectorySource, Pipeline, PipelineConfig};

/// Features clustered by the default evaluation
const DEFAULT_FEATURES: [&str; 7] = [
    "SEXO",
    "season",
    "weekday",
    "holiday",
    "day_period",
    "age_group",
    "method",
];

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_json_file(Path::new(&path))
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides();

    let source_dir = std::env::var(SOURCE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| config.cache_dir.join("source"));
    if !source_dir.exists() {
        warn!("Source directory not found: {}", source_dir.display());
    }
    info!(
        "Using source pages from {} and cache at {}",
        source_dir.display(),
        config.cache_dir.display()
    );

    let labeled_path = config.labeled_path.clone();
    let imputation_threshold = config.imputation_threshold;
    let pipeline = Pipeline::new(ParquetDirectorySource::new(source_dir), config);

    let start = Instant::now();
    let enriched = pipeline
        .acquire_default(Dataset::Mortality)
        .context("failed to acquire mortality data")?;
    info!("Acquired {} enriched records in {:?}", enriched.num_rows(), start.elapsed());

    let regions = pipeline
        .region_table(&pipeline.config().regions, &pipeline.config().years)
        .context("failed to build the region table")?;
    info!("Region table: {} municipalities", regions.num_rows());
    for summary in describe_numeric(&regions)? {
        println!(
            "{:<22} n={:<6} mean={:>10.3} std={:>10.3} min={:>10.3} max={:>10.3}",
            summary.column,
            summary.count,
            summary.mean.unwrap_or(f64::NAN),
            summary.std.unwrap_or(f64::NAN),
            summary.min.unwrap_or(f64::NAN),
            summary.max.unwrap_or(f64::NAN),
        );
    }

    if enriched.num_rows() < 3 {
        warn!("Not enough records to cluster");
        return Ok(());
    }

    let features = project_as_strings(&enriched, &DEFAULT_FEATURES)?;
    let (encoded, tree) = build_tree(&features, LinkageMethod::default(), imputation_threshold)
        .context("failed to build the linkage tree")?;
    let thresholds = candidate_thresholds(&tree, 6);
    if thresholds.is_empty() {
        warn!("No threshold splits the records into a useful number of clusters");
        return Ok(());
    }

    let report = evaluate(&encoded, &tree, &thresholds)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(best) = report.best_by_silhouette() {
        apply_threshold(&encoded, &tree, best.threshold, &labeled_path)
            .context("failed to persist the labeled dataset")?;
        info!(
            "Labeled dataset with {} clusters written to {}",
            best.clusters,
            labeled_path.display()
        );
    }

    Ok(())
}
