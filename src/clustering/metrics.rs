//! Internal validation scores for a flat clustering.

use ndarray::{Array1, Array2, Axis};
use rustc_hash::FxHashMap;

use super::linkage::condensed_index;

/// Distinct labels in first-seen order and the cluster index of every row
fn index_labels(labels: &[i32]) -> (usize, Vec<usize>) {
    let mut index: FxHashMap<i32, usize> = FxHashMap::default();
    let rows = labels
        .iter()
        .map(|label| {
            let next = index.len();
            *index.entry(*label).or_insert(next)
        })
        .collect();
    (index.len(), rows)
}

/// Mean silhouette coefficient
///
/// For each row `(b - a) / max(a, b)` with `a` the mean distance to its own
/// cluster and `b` the smallest mean distance to another cluster. Rows of a
/// singleton cluster score 0.
///
/// # Arguments
/// * `distances` - Condensed pairwise distances over `labels.len()` rows
/// * `labels` - Cluster label per row; at least two clusters expected
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn silhouette_score(distances: &[f64], labels: &[i32]) -> f64 {
    let n = labels.len();
    let (k, cluster) = index_labels(labels);
    if n == 0 || k < 2 {
        return 0.0;
    }

    let mut sizes = vec![0usize; k];
    for &c in &cluster {
        sizes[c] += 1;
    }

    // Sum of distances from every row to every cluster
    let mut sums = Array2::<f64>::zeros((n, k));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = distances[condensed_index(n, i, j)];
            sums[[i, cluster[j]]] += d;
            sums[[j, cluster[i]]] += d;
        }
    }

    let total: f64 = (0..n)
        .map(|i| {
            let own = cluster[i];
            if sizes[own] < 2 {
                return 0.0;
            }
            let a = sums[[i, own]] / (sizes[own] - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != own)
                .map(|c| sums[[i, c]] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);
            let scale = a.max(b);
            if scale > 0.0 { (b - a) / scale } else { 0.0 }
        })
        .sum();
    total / n as f64
}

/// Calinski–Harabasz variance ratio
///
/// Between-cluster over within-cluster dispersion, scaled by
/// `(n - k) / (k - 1)`. Returns 1.0 when the within-cluster dispersion is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn variance_ratio_score(values: &Array2<f64>, labels: &[i32]) -> f64 {
    let n = values.nrows();
    let (k, cluster) = index_labels(labels);
    if n == 0 || k < 2 || k >= n {
        return 0.0;
    }

    let Some(mean) = values.mean_axis(Axis(0)) else {
        return 0.0;
    };
    let mut centroids = Array2::<f64>::zeros((k, values.ncols()));
    let mut sizes = vec![0usize; k];
    for (row, &c) in values.rows().into_iter().zip(&cluster) {
        let mut centroid = centroids.row_mut(c);
        centroid += &row;
        sizes[c] += 1;
    }
    for (mut centroid, &size) in centroids.rows_mut().into_iter().zip(&sizes) {
        centroid /= size as f64;
    }

    let squared = |a: &Array1<f64>| a.iter().map(|v| v * v).sum::<f64>();
    let between: f64 = centroids
        .rows()
        .into_iter()
        .zip(&sizes)
        .map(|(centroid, &size)| size as f64 * squared(&(&centroid - &mean)))
        .sum();
    let within: f64 = values
        .rows()
        .into_iter()
        .zip(&cluster)
        .map(|(row, &c)| squared(&(&row - &centroids.row(c))))
        .sum();

    if within == 0.0 {
        return 1.0;
    }
    between * (n - k) as f64 / (within * (k - 1) as f64)
}
