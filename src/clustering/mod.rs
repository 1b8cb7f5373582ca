//! Clustering engine
//!
//! Builds a hierarchical merge tree over an imputed, one-hot encoded feature
//! table, scores distance cuts of that tree and materializes one chosen cut as
//! the labeled dataset.

pub mod cut;
pub mod encoding;
pub mod linkage;
pub mod metrics;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::utils::arrow::{get_column, with_column};
use crate::utils::io::{read_json, read_parquet_table, write_json_atomic, write_parquet_atomic};
use crate::utils::logging::log_warning;

pub use cut::{candidate_thresholds, count_clusters, cut_at_distance};
pub use encoding::{EncodedFeature, EncodedTable, EncodingSchema, FeatureKind, encode};
pub use linkage::{LinkageMethod, LinkageTree, Merge, condensed_distances, linkage};
pub use metrics::{silhouette_score, variance_ratio_score};

/// Column holding the cluster label in a labeled table
pub const CLUSTER_COLUMN: &str = "cluster";

/// Impute, encode and cluster `table`
///
/// # Arguments
/// * `table` - Feature table, one row per observation
/// * `method` - Linkage criterion
/// * `imputation_threshold` - Columns missing at least this fraction are not imputed
///
/// # Errors
/// [`SimError::InvalidInput`] for fewer than 2 rows,
/// [`SimError::NonFiniteDistance`] when un-imputed numeric gaps remain
pub fn build_tree(
    table: &RecordBatch,
    method: LinkageMethod,
    imputation_threshold: f64,
) -> Result<(EncodedTable, LinkageTree)> {
    if table.num_rows() < 2 {
        return Err(SimError::InvalidInput(format!(
            "clustering needs at least 2 rows, got {}",
            table.num_rows()
        )));
    }
    let start = std::time::Instant::now();
    let encoded = encode(table, imputation_threshold)?;
    let tree = linkage::linkage_from_values(encoded.values(), method)?;
    log::info!(
        "Built {method} linkage tree over {} rows in {:?}",
        encoded.nrows(),
        start.elapsed()
    );
    Ok((encoded, tree))
}

/// Scores of one distance cut
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    pub threshold: f64,
    pub clusters: usize,
    pub silhouette: f64,
    pub variance_ratio: f64,
}

/// Scores of every evaluated cut, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub method: LinkageMethod,
    pub rows: Vec<EvaluationRow>,
}

impl EvaluationReport {
    /// Row with the highest silhouette score
    #[must_use]
    pub fn best_by_silhouette(&self) -> Option<&EvaluationRow> {
        self.rows
            .iter()
            .max_by(|a, b| a.silhouette.total_cmp(&b.silhouette))
    }

    /// The report as a table
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("threshold", DataType::Float64, false),
            Field::new("clusters", DataType::UInt64, false),
            Field::new("silhouette", DataType::Float64, false),
            Field::new("variance_ratio", DataType::Float64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from_iter_values(self.rows.iter().map(|r| r.threshold))),
            Arc::new(UInt64Array::from_iter_values(
                self.rows.iter().map(|r| r.clusters as u64),
            )),
            Arc::new(Float64Array::from_iter_values(self.rows.iter().map(|r| r.silhouette))),
            Arc::new(Float64Array::from_iter_values(
                self.rows.iter().map(|r| r.variance_ratio),
            )),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

fn check_tree(encoded: &EncodedTable, tree: &LinkageTree) -> Result<()> {
    if tree.leaves() != encoded.nrows() {
        return Err(SimError::InvalidInput(format!(
            "tree over {} leaves does not match table of {} rows",
            tree.leaves(),
            encoded.nrows()
        )));
    }
    Ok(())
}

/// Score a set of distance cuts
///
/// Every threshold is validated before any scoring happens.
///
/// # Errors
/// [`SimError::DegenerateCut`] when a threshold yields a single cluster or as
/// many clusters as rows
pub fn evaluate(
    encoded: &EncodedTable,
    tree: &LinkageTree,
    thresholds: &[f64],
) -> Result<EvaluationReport> {
    check_tree(encoded, tree)?;
    let rows = encoded.nrows();

    let cuts = thresholds
        .iter()
        .map(|&threshold| {
            let labels = cut_at_distance(tree, threshold);
            let clusters = count_clusters(&labels);
            if clusters < 2 || clusters >= rows {
                return Err(SimError::DegenerateCut {
                    threshold,
                    clusters,
                    rows,
                });
            }
            Ok((threshold, clusters, labels))
        })
        .collect::<Result<Vec<_>>>()?;

    let distances = condensed_distances(encoded.values())?;
    let rows = cuts
        .into_iter()
        .map(|(threshold, clusters, labels)| {
            let row = EvaluationRow {
                threshold,
                clusters,
                silhouette: silhouette_score(&distances, &labels),
                variance_ratio: variance_ratio_score(encoded.values(), &labels),
            };
            log::info!(
                "Threshold {threshold}: {clusters} clusters, silhouette {:.4}, variance ratio {:.4}",
                row.silhouette,
                row.variance_ratio
            );
            row
        })
        .collect();

    Ok(EvaluationReport {
        method: tree.method(),
        rows,
    })
}

/// A labeled table and the encoding schema of its feature columns
#[derive(Debug, Clone)]
pub struct LabeledTable {
    pub table: RecordBatch,
    pub schema: EncodingSchema,
}

impl LabeledTable {
    /// Cluster label of every row
    pub fn labels(&self) -> Result<Vec<i32>> {
        let column = get_column(&self.table, CLUSTER_COLUMN)?;
        let labels = column
            .as_any()
            .downcast_ref::<Int32Array>()
            .ok_or_else(|| SimError::InvalidColumnType {
                column: CLUSTER_COLUMN.to_string(),
                expected: "Int32".to_string(),
            })?;
        Ok(labels.iter().map(Option::unwrap_or_default).collect())
    }
}

/// Location of the encoding schema stored next to a labeled table
#[must_use]
pub fn schema_sidecar_path(labeled_path: &Path) -> PathBuf {
    labeled_path.with_extension("schema.json")
}

/// Cut `tree` at `threshold` and persist the labeled table to `path`
///
/// The encoded table gains an `Int32` `cluster` column. `path` is a single
/// slot: a previous labeling there is replaced atomically.
pub fn apply_threshold(
    encoded: &EncodedTable,
    tree: &LinkageTree,
    threshold: f64,
    path: &Path,
) -> Result<LabeledTable> {
    check_tree(encoded, tree)?;
    let labels = cut_at_distance(tree, threshold);
    let clusters = count_clusters(&labels);

    let table = with_column(
        &encoded.to_record_batch()?,
        CLUSTER_COLUMN,
        Arc::new(Int32Array::from(labels)),
    )?;
    write_parquet_atomic(path, &table)?;
    write_json_atomic(&schema_sidecar_path(path), encoded.schema())?;
    log::info!(
        "Applied threshold {threshold}: {clusters} clusters written to {}",
        path.display()
    );

    Ok(LabeledTable {
        table,
        schema: encoded.schema().clone(),
    })
}

/// Read the last applied labeling, `None` when nothing was applied yet
pub fn load_labeled(path: &Path) -> Result<Option<LabeledTable>> {
    if !path.is_file() {
        return Ok(None);
    }
    let table = read_parquet_table(path)?;
    let schema = read_json(&schema_sidecar_path(path))?.unwrap_or_else(|| {
        log_warning("Labeled table has no encoding schema", Some(path));
        EncodingSchema::default()
    });
    Ok(Some(LabeledTable { table, schema }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StringArray;

    fn table() -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            (
                "x",
                Arc::new(Float64Array::from(vec![0.0, 0.1, 5.0, 5.1, 10.0, 10.2])) as ArrayRef,
            ),
            (
                "group",
                Arc::new(StringArray::from(vec!["a", "a", "b", "b", "c", "c"])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_evaluate_reports_each_threshold() {
        let (encoded, tree) = build_tree(&table(), LinkageMethod::Complete, 0.3).unwrap();
        assert_eq!(encoded.columns().len(), 4);
        assert_eq!(tree.height(), 5);

        let report = evaluate(&encoded, &tree, &[1.0, 7.0]).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].clusters, 3);
        assert_eq!(report.rows[1].clusters, 2);
        assert!(report.rows.iter().all(|r| (-1.0..=1.0).contains(&r.silhouette)));
        assert!(report.rows[0].variance_ratio > 0.0);
        assert_eq!(report.best_by_silhouette().unwrap().clusters, 3);
        assert_eq!(report.to_record_batch().unwrap().num_rows(), 2);
    }

    #[test]
    fn test_degenerate_cuts_are_rejected() {
        let (encoded, tree) = build_tree(&table(), LinkageMethod::Average, 0.3).unwrap();
        assert!(matches!(
            evaluate(&encoded, &tree, &[1.0, 1000.0]),
            Err(SimError::DegenerateCut { clusters: 1, .. })
        ));
        assert!(matches!(
            evaluate(&encoded, &tree, &[0.0]),
            Err(SimError::DegenerateCut { clusters: 6, .. })
        ));
    }

    #[test]
    fn test_apply_threshold_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labeled_data.parquet");
        let (encoded, tree) = build_tree(&table(), LinkageMethod::Ward, 0.3).unwrap();

        let first = apply_threshold(&encoded, &tree, 1.0, &path).unwrap();
        let second = apply_threshold(&encoded, &tree, 1.0, &path).unwrap();
        assert_eq!(first.labels().unwrap(), second.labels().unwrap());
        let labels = first.labels().unwrap();
        assert_eq!(count_clusters(&labels), 3);
        assert!(labels[0] == labels[1] && labels[2] == labels[3] && labels[4] == labels[5]);

        let loaded = load_labeled(&path).unwrap().unwrap();
        assert_eq!(loaded.table, second.table);
        assert_eq!(&loaded.schema, encoded.schema());

        // single slot: a new threshold replaces the labeling
        apply_threshold(&encoded, &tree, 100.0, &path).unwrap();
        let replaced = load_labeled(&path).unwrap().unwrap();
        assert_eq!(replaced.labels().unwrap(), vec![1; 6]);
    }

    #[test]
    fn test_too_few_rows() {
        let single = table().slice(0, 1);
        assert!(matches!(
            build_tree(&single, LinkageMethod::Single, 0.3),
            Err(SimError::InvalidInput(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        assert!(load_labeled(&dir.path().join("none.parquet")).unwrap().is_none());
    }

    #[test]
    fn test_unimputed_numeric_gap_fails() {
        let sparse = RecordBatch::try_from_iter(vec![(
            "x",
            Arc::new(Float64Array::from(vec![Some(1.0), None, None, Some(2.0)])) as ArrayRef,
        )])
        .unwrap();
        assert!(matches!(
            build_tree(&sparse, LinkageMethod::Single, 0.3),
            Err(SimError::NonFiniteDistance)
        ));
    }
}
