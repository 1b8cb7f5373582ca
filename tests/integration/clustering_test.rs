use arrow::record_batch::RecordBatch;
use sim_analytics::analysis::{cluster_sizes, crosstab};
use sim_analytics::clustering::{candidate_thresholds, count_clusters, schema_sidecar_path};
use sim_analytics::query::load_labeled;
use sim_analytics::{
    Dataset, LinkageMethod, Pipeline, SimError, apply_threshold, build_tree, evaluate,
};

use crate::utils::{FakeSource, regions, test_config};

const FEATURES: [&str; 4] = ["season", "day_period", "age_group", "average_suicide_rate"];

fn feature_table(pipeline: &Pipeline<FakeSource>) -> RecordBatch {
    let enriched = pipeline
        .acquire(Dataset::Mortality, &regions(&["PR", "SC"]), &[2015, 2016])
        .unwrap();
    let schema = enriched.schema();
    let indices: Vec<usize> = FEATURES
        .iter()
        .map(|name| schema.index_of(name).unwrap())
        .collect();
    enriched.project(&indices).unwrap()
}

#[test]
fn test_cluster_enriched_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let labeled_path = config.labeled_path.clone();
    let pipeline = Pipeline::new(FakeSource::synthetic(), config);
    let table = feature_table(&pipeline);

    let (encoded, tree) = build_tree(&table, LinkageMethod::Average, 0.3).unwrap();
    assert_eq!(encoded.nrows(), 5);
    assert_eq!(tree.leaves(), 5);
    assert_eq!(tree.merges().len(), 4);
    assert!(encoded.columns().iter().any(|c| c.starts_with("season_")));
    assert!(encoded.columns().contains(&"average_suicide_rate".to_string()));

    let thresholds = candidate_thresholds(&tree, 4);
    assert!(!thresholds.is_empty());
    let report = evaluate(&encoded, &tree, &thresholds).unwrap();
    assert_eq!(report.rows.len(), thresholds.len());
    for row in &report.rows {
        assert!((2..5).contains(&row.clusters));
        assert!((-1.0..=1.0).contains(&row.silhouette));
        assert!(row.variance_ratio >= 0.0);
    }

    let best = report.best_by_silhouette().unwrap().threshold;
    let labeled = apply_threshold(&encoded, &tree, best, &labeled_path).unwrap();
    assert!(schema_sidecar_path(&labeled_path).is_file());

    let labels = labeled.labels().unwrap();
    assert_eq!(labels.len(), 5);
    assert!(labels.iter().all(|&l| l >= 1));
    let sizes = cluster_sizes(&labeled).unwrap();
    assert_eq!(sizes.iter().map(|(_, n)| n).sum::<usize>(), 5);
    assert_eq!(sizes.len(), count_clusters(&labels));

    let loaded = load_labeled(&labeled_path).unwrap().unwrap();
    assert_eq!(loaded.labels().unwrap(), labels);
    assert_eq!(loaded.schema, labeled.schema);
    assert_eq!(
        loaded.schema.columns_of("season"),
        labeled.schema.columns_of("season")
    );
}

#[test]
fn test_apply_threshold_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let labeled_path = config.labeled_path.clone();
    let pipeline = Pipeline::new(FakeSource::synthetic(), config);
    let table = feature_table(&pipeline);

    let (encoded, tree) = build_tree(&table, LinkageMethod::Complete, 0.3).unwrap();
    let threshold = candidate_thresholds(&tree, 3)[0];

    let first = apply_threshold(&encoded, &tree, threshold, &labeled_path).unwrap();
    let second = apply_threshold(&encoded, &tree, threshold, &labeled_path).unwrap();
    assert_eq!(first.table, second.table);

    let loaded = load_labeled(&labeled_path).unwrap().unwrap();
    assert_eq!(loaded.table, second.table);
}

#[test]
fn test_degenerate_threshold_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));
    let table = feature_table(&pipeline);

    let (encoded, tree) = build_tree(&table, LinkageMethod::Ward, 0.3).unwrap();
    let above_root = tree.merges().last().unwrap().distance + 1.0;
    assert!(matches!(
        evaluate(&encoded, &tree, &[above_root]),
        Err(SimError::DegenerateCut { clusters: 1, .. })
    ));
}

#[test]
fn test_nothing_applied_yet() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    assert!(load_labeled(&config.labeled_path).unwrap().is_none());
}

#[test]
fn test_crosstab_of_enriched_records() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));
    let enriched = pipeline
        .acquire(Dataset::Mortality, &regions(&["PR", "SC"]), &[2015, 2016])
        .unwrap();

    let table = crosstab(&enriched, "state", "method", true).unwrap();
    for row in table.values.rows() {
        let total: f64 = row.iter().sum();
        assert!((total - 100.0).abs() < 1e-9 || total == 0.0);
    }
}
