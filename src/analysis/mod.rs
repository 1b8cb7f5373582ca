//! Descriptive analysis consumed by the presentation layer: numeric
//! summaries, cross tabulations and per-cluster feature profiles.

use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use ndarray::Array2;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::clustering::LabeledTable;
use crate::error::{Result, SimError};
use crate::utils::arrow::{f64_values, is_numeric, null_counts, string_values};

pub use crate::lookup::data_dictionary;

/// Summary statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Count, mean, standard deviation and range of every numeric column
pub fn describe_numeric(table: &RecordBatch) -> Result<Vec<NumericSummary>> {
    let schema = table.schema();
    schema
        .fields()
        .iter()
        .filter(|field| is_numeric(field.data_type()))
        .map(|field| {
            let values = f64_values(table, field.name())?
                .into_iter()
                .flatten()
                .filter(|v| !v.is_nan())
                .collect_vec();
            let count = values.len();
            #[allow(clippy::cast_precision_loss)]
            let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
            #[allow(clippy::cast_precision_loss)]
            let std = mean.filter(|_| count > 1).map(|m| {
                (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
            });
            Ok(NumericSummary {
                column: field.name().clone(),
                count,
                mean,
                std,
                min: values.iter().copied().reduce(f64::min),
                max: values.iter().copied().reduce(f64::max),
            })
        })
        .collect()
}

/// Counts of `plot_feature` values per `axis_feature` value
#[derive(Debug, Clone, PartialEq)]
pub struct Crosstab {
    /// Row labels, sorted
    pub axis_values: Vec<String>,
    /// Column labels, sorted
    pub plot_values: Vec<String>,
    /// `axis_values.len() x plot_values.len()` counts or row percentages
    pub values: Array2<f64>,
}

/// Cross-tabulate two columns (stacked-bar data)
///
/// Rows with a missing value in either column are skipped. With `percent`
/// every row is normalised to sum to 100.
pub fn crosstab(
    table: &RecordBatch,
    plot_feature: &str,
    axis_feature: &str,
    percent: bool,
) -> Result<Crosstab> {
    let plot = string_values(table, plot_feature)?;
    let axis = string_values(table, axis_feature)?;
    let pairs = axis
        .into_iter()
        .zip(plot)
        .filter_map(|(a, p)| Some((a?, p?)))
        .collect_vec();

    let axis_values = pairs.iter().map(|(a, _)| a.clone()).unique().sorted().collect_vec();
    let plot_values = pairs.iter().map(|(_, p)| p.clone()).unique().sorted().collect_vec();
    let axis_index: FxHashMap<&str, usize> =
        axis_values.iter().enumerate().map(|(i, v)| (v.as_str(), i)).collect();
    let plot_index: FxHashMap<&str, usize> =
        plot_values.iter().enumerate().map(|(i, v)| (v.as_str(), i)).collect();

    let mut values = Array2::<f64>::zeros((axis_values.len(), plot_values.len()));
    for (a, p) in &pairs {
        values[[axis_index[a.as_str()], plot_index[p.as_str()]]] += 1.0;
    }
    if percent {
        for mut row in values.rows_mut() {
            let total = row.sum();
            if total > 0.0 {
                row *= 100.0 / total;
            }
        }
    }

    Ok(Crosstab {
        axis_values,
        plot_values,
        values,
    })
}

/// Number of rows per cluster label, ordered by label
pub fn cluster_sizes(labeled: &LabeledTable) -> Result<Vec<(i32, usize)>> {
    Ok(labeled
        .labels()?
        .into_iter()
        .counts()
        .into_iter()
        .sorted()
        .collect())
}

/// Mean of each encoded column of one feature, per cluster (heat-map data)
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMeans {
    /// Cluster labels, ascending; one matrix row each
    pub clusters: Vec<i32>,
    /// Encoded columns of the feature; one matrix column each
    pub columns: Vec<String>,
    pub means: Array2<f64>,
}

/// Per-cluster mean of every encoded column belonging to `feature`
///
/// Columns are resolved through the labeled table's encoding schema. For a
/// categorical feature the means are the share of each category per cluster.
///
/// # Errors
/// [`SimError::InvalidInput`] when `feature` is not part of the encoding
pub fn feature_cluster_means(labeled: &LabeledTable, feature: &str) -> Result<ClusterMeans> {
    let columns = labeled
        .schema
        .columns_of(feature)
        .ok_or_else(|| SimError::InvalidInput(format!("'{feature}' is not an encoded feature")))?
        .to_vec();
    let labels = labeled.labels()?;
    let clusters = labels.iter().copied().unique().sorted().collect_vec();
    let cluster_index: FxHashMap<i32, usize> =
        clusters.iter().enumerate().map(|(i, c)| (*c, i)).collect();

    let mut sums = Array2::<f64>::zeros((clusters.len(), columns.len()));
    let mut counts = Array2::<f64>::zeros((clusters.len(), columns.len()));
    for (j, column) in columns.iter().enumerate() {
        for (value, label) in f64_values(&labeled.table, column)?.into_iter().zip(&labels) {
            if let Some(v) = value.filter(|v| !v.is_nan()) {
                let i = cluster_index[label];
                sums[[i, j]] += v;
                counts[[i, j]] += 1.0;
            }
        }
    }
    let means = ndarray::Zip::from(&sums)
        .and(&counts)
        .map_collect(|&s, &c| if c > 0.0 { s / c } else { f64::NAN });

    Ok(ClusterMeans {
        clusters,
        columns,
        means,
    })
}

/// Null count of every column with at least one missing value
#[must_use]
pub fn columns_with_nulls(table: &RecordBatch) -> Vec<(String, usize)> {
    null_counts(table)
        .into_iter()
        .filter(|(_, nulls)| *nulls > 0)
        .collect()
}
