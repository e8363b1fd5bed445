use crate::node::{FeatureIndex, Impurity};

/// Information entropy of a node, `-sum(p_i * ln(p_i))`, from its class counts.
///
/// An empty node is pure.
#[must_use]
pub(crate) fn entropy(class_counts: &[usize], n_samples: usize) -> Impurity {
    if n_samples == 0 {
        return Impurity::new(0.0);
    }
    let n = n_samples as f64;
    let value = -class_counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| c as f64 / n)
        .map(|p| p * p.ln())
        .sum::<f64>();
    Impurity::new(value)
}

/// Best split found for one node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// Weighted entropy decrease, `n * parent - n_l * left - n_r * right`.
    pub(crate) gain: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Candidate threshold on one feature.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    threshold: f64,
    gain: f64,
}

/// Find the information-gain maximizing binary split over every column.
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
/// Returns `None` when no boundary has positive gain while keeping
/// `min_samples_leaf` samples on each side. Both sides of a returned split
/// are non-empty.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    min_samples_leaf: usize,
) -> Option<SplitResult> {
    if sample_indices.is_empty() || features.is_empty() {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }

    let mut best: Option<(FeatureIndex, Candidate)> = None;
    for (feat_idx, column) in features.iter().enumerate() {
        let candidate = scan_feature(column, labels, sample_indices, &parent_counts, min_samples_leaf);
        if let Some(c) = candidate
            && best.is_none_or(|(_, b)| c.gain > b.gain)
        {
            best = Some((FeatureIndex::new(feat_idx), c));
        }
    }

    let (feature, Candidate { threshold, gain }) = best?;
    let column = &features[feature.index()];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| column[si] <= threshold);
    if left_indices.is_empty() || right_indices.is_empty() {
        return None;
    }

    Some(SplitResult {
        feature,
        threshold,
        gain,
        left_indices,
        right_indices,
    })
}

/// Threshold between two distinct sorted values `value < next`.
///
/// The midpoint of adjacent floats can round up to `next`, which would send
/// every sample left; fall back to `value` then.
fn threshold_between(value: f64, next: f64) -> f64 {
    let mid = value + (next - value) / 2.0;
    if mid < next { mid } else { value }
}

/// Sort one column and sweep every boundary between distinct values.
fn scan_feature(
    column: &[f64],
    labels: &[usize],
    sample_indices: &[usize],
    parent_counts: &[usize],
    min_samples_leaf: usize,
) -> Option<Candidate> {
    let n_samples = sample_indices.len();
    let parent = entropy(parent_counts, n_samples).value();

    let mut sorted: Vec<(f64, usize)> = sample_indices
        .iter()
        .map(|&si| (column[si], labels[si]))
        .collect();
    sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let mut left_counts = vec![0usize; parent_counts.len()];
    let mut right_counts = parent_counts.to_vec();
    let mut best: Option<Candidate> = None;

    for i in 0..n_samples - 1 {
        let (value, class) = sorted[i];
        left_counts[class] += 1;
        right_counts[class] -= 1;

        let next = sorted[i + 1].0;
        if value == next {
            continue;
        }
        let n_left = i + 1;
        let n_right = n_samples - n_left;
        if n_left < min_samples_leaf || n_right < min_samples_leaf {
            continue;
        }

        let gain = n_samples as f64 * parent
            - n_left as f64 * entropy(&left_counts, n_left).value()
            - n_right as f64 * entropy(&right_counts, n_right).value();
        // Rounding noise on uninformative boundaries.
        if gain <= 1e-12 {
            continue;
        }

        if best.is_none_or(|b| gain > b.gain) {
            best = Some(Candidate {
                threshold: threshold_between(value, next),
                gain,
            });
        }
    }

    best
}
