//! Flat clusters from a linkage tree.

use itertools::Itertools;

use super::linkage::LinkageTree;

/// Cut `tree` at distance `threshold`
///
/// A subtree becomes one flat cluster when the largest merge height inside
/// it is at most `threshold`. Labels start at 1 and follow left-to-right tree
/// order, so the same `(tree, threshold)` always yields the same labels.
///
/// # Returns
/// One label per leaf, indexed by leaf id
#[must_use]
pub fn cut_at_distance(tree: &LinkageTree, threshold: f64) -> Vec<i32> {
    let n = tree.leaves();
    let merges = tree.merges();
    if n == 0 {
        return Vec::new();
    }
    if merges.is_empty() {
        return vec![1; n];
    }

    // Largest merge height within each internal node's subtree
    let mut max_height = vec![0.0_f64; merges.len()];
    for (step, merge) in merges.iter().enumerate() {
        let child = |id: usize| if id >= n { max_height[id - n] } else { 0.0 };
        let height = merge.distance.max(child(merge.left)).max(child(merge.right));
        max_height[step] = height;
    }

    let mut labels = vec![0_i32; n];
    let mut next_label = 0_i32;
    let mut stack = vec![n + merges.len() - 1];

    while let Some(id) = stack.pop() {
        if id < n {
            next_label += 1;
            labels[id] = next_label;
        } else if max_height[id - n] <= threshold {
            next_label += 1;
            let mut members = vec![id];
            while let Some(member) = members.pop() {
                if member < n {
                    labels[member] = next_label;
                } else {
                    let merge = &merges[member - n];
                    members.push(merge.left);
                    members.push(merge.right);
                }
            }
        } else {
            let merge = &merges[id - n];
            stack.push(merge.right);
            stack.push(merge.left);
        }
    }
    labels
}

/// Number of distinct labels in a cut
#[must_use]
pub fn count_clusters(labels: &[i32]) -> usize {
    labels.iter().unique().count()
}

/// Distinct merge heights that cut `tree` into `2..=max_clusters` clusters
///
/// The height of merge `m - k` (with `m` merges) leaves `k` clusters for
/// monotone trees; the actual count is checked, so non-monotone trees only
/// contribute thresholds that are valid for them.
#[must_use]
pub fn candidate_thresholds(tree: &LinkageTree, max_clusters: usize) -> Vec<f64> {
    let merges = tree.merges();
    let n = tree.leaves();
    (2..=max_clusters.min(merges.len()))
        .map(|k| merges[merges.len() - k].distance)
        .filter(|&t| {
            let clusters = count_clusters(&cut_at_distance(tree, t));
            clusters >= 2 && clusters < n
        })
        .sorted_by(f64::total_cmp)
        .dedup()
        .collect()
}
