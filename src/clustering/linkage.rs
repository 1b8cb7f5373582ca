//! Agglomerative hierarchical clustering.
//!
//! All methods share one Lance–Williams update loop over a condensed distance
//! matrix. Each active cluster caches its nearest neighbour among the active
//! clusters with a larger slot, so every step merges the globally closest pair.
//! `Ward`, `Centroid` and `Median` run on squared distances internally and
//! report Euclidean merge heights.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar};

/// Linkage criteria between clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LinkageMethod {
    /// Nearest point
    Single,
    /// Farthest point
    #[default]
    Complete,
    /// UPGMA
    Average,
    /// WPGMA
    Weighted,
    /// UPGMC
    Centroid,
    /// WPGMC
    Median,
    /// Minimum variance
    Ward,
}

impl LinkageMethod {
    /// Every method, in presentation order
    pub const ALL: [Self; 7] = [
        Self::Single,
        Self::Complete,
        Self::Average,
        Self::Weighted,
        Self::Centroid,
        Self::Median,
        Self::Ward,
    ];

    /// Lower-case method name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
            Self::Weighted => "weighted",
            Self::Centroid => "centroid",
            Self::Median => "median",
            Self::Ward => "ward",
        }
    }

    /// Label shown to users
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Single => "Single (nearest point)",
            Self::Complete => "Complete (farthest point)",
            Self::Average => "Average (UPGMA)",
            Self::Weighted => "Weighted (WPGMA)",
            Self::Centroid => "Centroid (UPGMC)",
            Self::Median => "Median (WPGMC)",
            Self::Ward => "Ward (minimum variance)",
        }
    }

    /// Whether merge heights are guaranteed to be non-decreasing
    #[must_use]
    pub const fn is_monotonic(self) -> bool {
        !matches!(self, Self::Centroid | Self::Median)
    }

    const fn uses_squared_distances(self) -> bool {
        matches!(self, Self::Ward | Self::Centroid | Self::Median)
    }

    /// Lance–Williams distance from cluster `k` to the union of `i` and `j`
    #[allow(clippy::cast_precision_loss, clippy::many_single_char_names)]
    fn update(self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64 {
        let (ni, nj, nk) = (n_i as f64, n_j as f64, n_k as f64);
        match self {
            Self::Single => d_ki.min(d_kj),
            Self::Complete => d_ki.max(d_kj),
            Self::Average => (ni * d_ki + nj * d_kj) / (ni + nj),
            Self::Weighted => (d_ki + d_kj) / 2.0,
            Self::Centroid => {
                let n = ni + nj;
                ((ni * d_ki + nj * d_kj) / n - ni * nj * d_ij / (n * n)).max(0.0)
            }
            Self::Median => (d_ki / 2.0 + d_kj / 2.0 - d_ij / 4.0).max(0.0),
            Self::Ward => {
                (((nk + ni) * d_ki + (nk + nj) * d_kj - nk * d_ij) / (nk + ni + nj)).max(0.0)
            }
        }
    }
}

impl fmt::Display for LinkageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for LinkageMethod {
    type Err = SimError;

    /// Accepts a method name or a label whose first word is one, e.g. `"Average (UPGMA)"`
    fn from_str(s: &str) -> Result<Self> {
        let first = s.split_whitespace().next().unwrap_or_default().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|method| method.name() == first)
            .ok_or_else(|| SimError::InvalidInput(format!("Unknown linkage method: '{s}'")))
    }
}

/// One merge step of a [`LinkageTree`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// Smaller id of the two merged clusters
    pub left: usize,
    /// Larger id of the two merged clusters
    pub right: usize,
    /// Merge height
    pub distance: f64,
    /// Number of leaves under the new cluster
    pub size: usize,
}

/// Result of agglomerative clustering over `n` leaves
///
/// Leaves are numbered `0..n`; the cluster created by merge `i` is `n + i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkageTree {
    leaves: usize,
    method: LinkageMethod,
    merges: Vec<Merge>,
}

impl LinkageTree {
    /// Number of clustered observations
    #[must_use]
    pub const fn leaves(&self) -> usize {
        self.leaves
    }

    /// Method the tree was built with
    #[must_use]
    pub const fn method(&self) -> LinkageMethod {
        self.method
    }

    /// Merge steps, `leaves - 1` of them
    #[must_use]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Height of the tree (number of merges)
    #[must_use]
    pub fn height(&self) -> usize {
        self.merges.len()
    }

    /// Merge steps as an `(n - 1) x 4` matrix of `[left, right, distance, size]`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::zeros((self.merges.len(), 4));
        for (i, merge) in self.merges.iter().enumerate() {
            matrix[[i, 0]] = merge.left as f64;
            matrix[[i, 1]] = merge.right as f64;
            matrix[[i, 2]] = merge.distance;
            matrix[[i, 3]] = merge.size as f64;
        }
        matrix
    }
}

/// Index of pair `(i, j)`, `i < j`, in a condensed matrix over `n` points
#[inline]
#[must_use]
pub const fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Condensed pairwise Euclidean distances between the rows of `values`
///
/// # Errors
/// Returns [`SimError::NonFiniteDistance`] when any distance is NaN or infinite
pub fn condensed_distances(values: &Array2<f64>) -> Result<Vec<f64>> {
    let n = values.nrows();
    let mut distances = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    let pb = create_main_progress_bar(n as u64, Some("Computing distances"));

    for i in 0..n {
        let a = values.row(i);
        for j in (i + 1)..n {
            let b = values.row(j);
            let d = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt();
            if !d.is_finite() {
                pb.abandon();
                return Err(SimError::NonFiniteDistance);
            }
            distances.push(d);
        }
        pb.inc(1);
    }

    finish_progress_bar(&pb, Some("Distances computed"));
    Ok(distances)
}

/// Nearest active neighbour of `k` among slots greater than `k`
fn nearest_above(k: usize, n: usize, active: &[bool], dist: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for m in (k + 1)..n {
        if !active[m] {
            continue;
        }
        let d = dist[condensed_index(n, k, m)];
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((m, d));
        }
    }
    best
}

/// Build a linkage tree from condensed distances over `n` points
///
/// # Errors
/// Returns [`SimError::InvalidInput`] when `n < 2` or the condensed matrix has
/// the wrong length, [`SimError::NonFiniteDistance`] for NaN or infinite entries
pub fn linkage(distances: &[f64], n: usize, method: LinkageMethod) -> Result<LinkageTree> {
    if n < 2 {
        return Err(SimError::InvalidInput(format!(
            "clustering needs at least 2 rows, got {n}"
        )));
    }
    if distances.len() != n * (n - 1) / 2 {
        return Err(SimError::InvalidInput(format!(
            "condensed matrix of length {} does not match {n} points",
            distances.len()
        )));
    }

    if distances.iter().any(|d| !d.is_finite()) {
        return Err(SimError::NonFiniteDistance);
    }

    let squared = method.uses_squared_distances();
    let mut dist: Vec<f64> = if squared {
        distances.iter().map(|d| d * d).collect()
    } else {
        distances.to_vec()
    };

    let mut active = vec![true; n];
    let mut size = vec![1usize; n];
    let mut node: Vec<usize> = (0..n).collect();
    let mut nearest: Vec<Option<(usize, f64)>> =
        (0..n).map(|k| nearest_above(k, n, &active, &dist)).collect();
    let mut merges = Vec::with_capacity(n - 1);

    for step in 0..(n - 1) {
        // Globally closest pair; ties go to the smallest slot
        let Some((i, (j, d_ij))) = (0..n)
            .filter(|&k| active[k])
            .filter_map(|k| nearest[k].map(|nn| (k, nn)))
            .reduce(|best, cand| if cand.1.1 < best.1.1 { cand } else { best })
        else {
            return Err(SimError::InvalidInput(
                "no mergeable pair left (inconsistent distances)".to_string(),
            ));
        };

        let (a, b) = (node[i].min(node[j]), node[i].max(node[j]));
        merges.push(Merge {
            left: a,
            right: b,
            distance: if squared { d_ij.sqrt() } else { d_ij },
            size: size[i] + size[j],
        });

        // The union lives on in slot j
        active[i] = false;
        nearest[i] = None;
        for k in (0..n).filter(|&k| active[k] && k != j) {
            let d_ki = dist[condensed_index(n, k.min(i), k.max(i))];
            let d_kj = dist[condensed_index(n, k.min(j), k.max(j))];
            dist[condensed_index(n, k.min(j), k.max(j))] =
                method.update(d_ki, d_kj, d_ij, size[i], size[j], size[k]);
        }
        size[j] += size[i];
        node[j] = n + step;

        for k in (0..j).filter(|&k| active[k]) {
            match nearest[k] {
                Some((m, _)) if m == i || m == j => nearest[k] = nearest_above(k, n, &active, &dist),
                Some((_, best)) => {
                    let d_kj = dist[condensed_index(n, k, j)];
                    if d_kj < best {
                        nearest[k] = Some((j, d_kj));
                    }
                }
                None => nearest[k] = nearest_above(k, n, &active, &dist),
            }
        }
        nearest[j] = nearest_above(j, n, &active, &dist);
    }

    if method.is_monotonic() && merges.windows(2).any(|w| w[1].distance < w[0].distance) {
        log::debug!("Merge heights of {method} tree are not monotone (floating-point ties)");
    }
    Ok(LinkageTree {
        leaves: n,
        method,
        merges,
    })
}

/// Build a linkage tree over the rows of `values`
pub fn linkage_from_values(values: &Array2<f64>, method: LinkageMethod) -> Result<LinkageTree> {
    let n = values.nrows();
    if n < 2 {
        return Err(SimError::InvalidInput(format!(
            "clustering needs at least 2 rows, got {n}"
        )));
    }
    let distances = condensed_distances(values)?;
    linkage(&distances, n, method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn points() -> Array2<f64> {
        array![[0.0, 0.0], [0.0, 1.0], [5.0, 0.0], [5.0, 2.0], [20.0, 0.0]]
    }

    #[test]
    fn test_parse_method() {
        assert_eq!("ward".parse::<LinkageMethod>().unwrap(), LinkageMethod::Ward);
        assert_eq!(
            "Average (UPGMA)".parse::<LinkageMethod>().unwrap(),
            LinkageMethod::Average
        );
        assert!("kmeans".parse::<LinkageMethod>().is_err());
        for method in LinkageMethod::ALL {
            assert_eq!(method.display_name().parse::<LinkageMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_condensed_distances() {
        let d = condensed_distances(&array![[0.0, 0.0], [3.0, 4.0], [0.0, 1.0]]).unwrap();
        assert_eq!(d, vec![5.0, 1.0, 18.0_f64.sqrt()]);
        assert_eq!(condensed_index(3, 1, 2), 2);
        assert!(matches!(
            condensed_distances(&array![[0.0], [f64::NAN]]),
            Err(SimError::NonFiniteDistance)
        ));
    }

    #[test]
    fn test_single_linkage() {
        let tree = linkage_from_values(&points(), LinkageMethod::Single).unwrap();
        assert_eq!(tree.height(), 4);
        let merges = tree.merges();
        assert_eq!((merges[0].left, merges[0].right, merges[0].size), (0, 1, 2));
        assert!((merges[0].distance - 1.0).abs() < 1e-12);
        assert_eq!((merges[1].left, merges[1].right, merges[1].size), (2, 3, 2));
        assert!((merges[1].distance - 2.0).abs() < 1e-12);
        // {0,1} to {2,3}: closest pair (0,1)-(5,0) at distance 5
        assert_eq!((merges[2].left, merges[2].right, merges[2].size), (5, 6, 4));
        assert!((merges[2].distance - 5.0).abs() < 1e-12);
        assert_eq!((merges[3].left, merges[3].right, merges[3].size), (4, 7, 5));
        assert!((merges[3].distance - 15.0).abs() < 1e-12);

        let matrix = tree.to_matrix();
        assert_eq!(matrix.dim(), (4, 4));
        assert_eq!(matrix.row(3).to_vec(), vec![4.0, 7.0, 15.0, 5.0]);
    }

    #[test]
    fn test_complete_and_average_heights() {
        let complete = linkage_from_values(&points(), LinkageMethod::Complete).unwrap();
        // {0,1} to {2,3}: farthest pair is (0,0)-(5,2)
        assert!((complete.merges()[2].distance - 29.0_f64.sqrt()).abs() < 1e-12);

        let average = linkage_from_values(&points(), LinkageMethod::Average).unwrap();
        let expected = (5.0 + 29.0_f64.sqrt() + 2.0 * 26.0_f64.sqrt()) / 4.0;
        assert!((average.merges()[2].distance - expected).abs() < 1e-12);
    }

    #[test]
    fn test_ward_two_points() {
        let tree = linkage_from_values(&array![[0.0], [2.0]], LinkageMethod::Ward).unwrap();
        assert!((tree.merges()[0].distance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ward_three_points() {
        // sqrt(2 |A| |B| / (|A| + |B|)) times the centroid distance 3.5
        let tree = linkage_from_values(&array![[0.0], [1.0], [4.0]], LinkageMethod::Ward).unwrap();
        let merges = tree.merges();
        assert!((merges[0].distance - 1.0).abs() < 1e-12);
        let expected = ((2.0 * 1.0 / 3.0) * 2.0 * 3.5_f64.powi(2)).sqrt();
        assert!((merges[1].distance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_methods_non_decreasing() {
        for method in LinkageMethod::ALL.into_iter().filter(|m| m.is_monotonic()) {
            let tree = linkage_from_values(&points(), method).unwrap();
            assert!(
                tree.merges().windows(2).all(|w| w[0].distance <= w[1].distance + 1e-12),
                "{method} not monotone"
            );
            assert_eq!(tree.merges().last().unwrap().size, 5);
        }
    }

    #[test]
    fn test_too_few_rows() {
        assert!(matches!(
            linkage_from_values(&array![[1.0]], LinkageMethod::Single),
            Err(SimError::InvalidInput(_))
        ));
    }
}
