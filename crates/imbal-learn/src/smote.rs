//! SMOTE: synthetic minority oversampling by neighbour interpolation.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::LearnError;
use crate::tree::validate_matrix;

/// How a feature column is interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Continuous value, interpolated between neighbours.
    Numeric,
    /// Encoded category, copied from the neighbourhood majority.
    Nominal,
}

/// Which class receives synthetic samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassSelection {
    /// The class with the fewest (non-zero) samples, lowest label on ties.
    Auto,
    /// An explicit class label.
    Label(usize),
}

/// SMOTE configuration.
///
/// # Defaults
///
/// | Parameter     | Default |
/// |---------------|---------|
/// | `k_neighbors` | 5       |
/// | `seed`        | 1       |
/// | `class`       | `Auto`  |
#[derive(Debug, Clone)]
pub struct SmoteConfig {
    percentage: f64,
    k_neighbors: usize,
    seed: u64,
    class: ClassSelection,
}

/// Oversampled data: the original rows in order, then the synthetic rows.
#[derive(Debug, Clone)]
pub struct Resampled {
    /// Row-major feature matrix.
    pub features: Vec<Vec<f64>>,
    /// Class label per row.
    pub labels: Vec<usize>,
    /// The class that was oversampled.
    pub class: usize,
    /// Number of synthetic rows appended.
    pub n_synthetic: usize,
}

impl SmoteConfig {
    /// Create a config generating `percentage`% of the minority count as
    /// synthetic rows (`100.0` doubles the class).
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::InvalidPercentage`] if `percentage` is NaN,
    /// infinite or negative.
    pub fn new(percentage: f64) -> Result<Self, LearnError> {
        if !percentage.is_finite() || percentage < 0.0 {
            return Err(LearnError::InvalidPercentage { percentage });
        }
        Ok(Self {
            percentage,
            k_neighbors: 5,
            seed: 1,
            class: ClassSelection::Auto,
        })
    }

    /// Set the number of nearest neighbours considered per minority row.
    #[must_use]
    pub fn with_k_neighbors(mut self, k_neighbors: usize) -> Self {
        self.k_neighbors = k_neighbors;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the class to oversample.
    #[must_use]
    pub fn with_class(mut self, class: ClassSelection) -> Self {
        self.class = class;
        self
    }

    /// Return the configured percentage.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Return the class selection.
    #[must_use]
    pub fn class(&self) -> ClassSelection {
        self.class
    }

    /// Generate synthetic rows for the selected class.
    ///
    /// Every minority row yields `floor(percentage / 100)` synthetic rows and a
    /// seeded random subset of rows yields one more, for a total of
    /// `floor(percentage / 100 * n_minority)`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`LearnError::InvalidNeighborCount`] | `k_neighbors` is zero |
    /// | [`LearnError::FeatureKindMismatch`] | `kinds.len()` differs from the feature count |
    /// | [`LearnError::NoInstancesOfClass`] | the selected class has no rows |
    /// | shape errors | as for [`crate::DecisionTreeConfig::fit`] |
    #[instrument(skip_all, fields(percentage = self.percentage, n_samples = features.len()))]
    pub fn resample(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        kinds: &[FeatureKind],
    ) -> Result<Resampled, LearnError> {
        if self.k_neighbors == 0 {
            return Err(LearnError::InvalidNeighborCount { k_neighbors: 0 });
        }
        let n_features = validate_matrix(features, labels)?;
        if kinds.len() != n_features {
            return Err(LearnError::FeatureKindMismatch {
                expected: n_features,
                got: kinds.len(),
            });
        }

        let class = match self.class {
            ClassSelection::Label(class) => class,
            ClassSelection::Auto => rarest_class(labels),
        };
        let minority: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        if minority.is_empty() {
            return Err(LearnError::NoInstancesOfClass { class });
        }

        let n_minority = minority.len();
        let n_synthetic = (self.percentage / 100.0 * n_minority as f64).floor() as usize;
        let per_row = (self.percentage / 100.0).floor() as usize;
        let n_extra = n_synthetic.saturating_sub(per_row * n_minority);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut extra = vec![false; n_minority];
        let mut picks: Vec<usize> = (0..n_minority).collect();
        picks.shuffle(&mut rng);
        for &p in picks.iter().take(n_extra) {
            extra[p] = true;
        }

        let k = self.k_neighbors.min(n_minority - 1);
        let rows: Vec<&[f64]> = minority.iter().map(|&i| features[i].as_slice()).collect();

        let mut out_features = features.to_vec();
        let mut out_labels = labels.to_vec();
        out_features.reserve(n_synthetic);
        out_labels.reserve(n_synthetic);

        for (m, row) in rows.iter().enumerate() {
            let copies = per_row + usize::from(extra[m]);
            if copies == 0 {
                continue;
            }
            let neighbors = nearest(m, &rows, kinds, k);
            let votes = nominal_votes(row, &neighbors, &rows, kinds);
            for _ in 0..copies {
                let synthetic = if neighbors.is_empty() {
                    row.to_vec()
                } else {
                    let other = rows[neighbors[rng.gen_range(0..neighbors.len())]];
                    let gap: f64 = rng.r#gen();
                    row.iter()
                        .zip(other)
                        .zip(kinds)
                        .zip(&votes)
                        .map(|(((&a, &b), kind), &vote)| match kind {
                            FeatureKind::Numeric => a + gap * (b - a),
                            FeatureKind::Nominal => vote,
                        })
                        .collect()
                };
                out_features.push(synthetic);
                out_labels.push(class);
            }
        }

        debug!(class, n_minority, k, n_synthetic, "smote resampled");

        Ok(Resampled {
            features: out_features,
            labels: out_labels,
            class,
            n_synthetic,
        })
    }
}

/// Class with the smallest non-zero count; lowest label wins ties.
fn rarest_class(labels: &[usize]) -> usize {
    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut counts = vec![0usize; n_classes];
    for &l in labels {
        counts[l] += 1;
    }
    counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .min_by_key(|&(_, &c)| c)
        .map_or(0, |(class, _)| class)
}

fn distance(a: &[f64], b: &[f64], kinds: &[FeatureKind]) -> f64 {
    a.iter()
        .zip(b)
        .zip(kinds)
        .map(|((&x, &y), kind)| match kind {
            FeatureKind::Numeric => (x - y) * (x - y),
            FeatureKind::Nominal => f64::from(u8::from(x != y)),
        })
        .sum()
}

/// Positions of the `k` nearest other rows to `rows[target]`, ties in row order.
fn nearest(target: usize, rows: &[&[f64]], kinds: &[FeatureKind], k: usize) -> Vec<usize> {
    let mut by_distance: Vec<(f64, usize)> = rows
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != target)
        .map(|(i, row)| (distance(rows[target], row, kinds), i))
        .collect();
    by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
    by_distance.into_iter().take(k).map(|(_, i)| i).collect()
}

/// Per-column majority value over the row and its neighbours (nominal
/// columns only; numeric columns get a placeholder that is never read).
fn nominal_votes(
    row: &[f64],
    neighbors: &[usize],
    rows: &[&[f64]],
    kinds: &[FeatureKind],
) -> Vec<f64> {
    kinds
        .iter()
        .enumerate()
        .map(|(col, kind)| {
            if *kind == FeatureKind::Numeric {
                return row[col];
            }
            let mut tally: Vec<(f64, usize)> = Vec::new();
            let values = std::iter::once(row[col]).chain(neighbors.iter().map(|&n| rows[n][col]));
            for v in values {
                match tally.iter_mut().find(|(x, _)| *x == v) {
                    Some((_, c)) => *c += 1,
                    None => tally.push((v, 1)),
                }
            }
            tally
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.total_cmp(&a.0)))
                .map_or(row[col], |(v, _)| v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 12 majority rows near the origin, 4 minority rows near (10, 10).
    fn imbalanced() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            features.push(vec![(i % 4) as f64, (i / 4) as f64]);
            labels.push(0);
        }
        for i in 0..4 {
            features.push(vec![10.0 + i as f64, 10.0 + (i % 2) as f64]);
            labels.push(1);
        }
        (features, labels)
    }

    const NUMERIC: [FeatureKind; 2] = [FeatureKind::Numeric, FeatureKind::Numeric];

    #[test]
    fn invalid_percentage_rejected() {
        for p in [f64::NAN, f64::INFINITY, -1.0] {
            assert!(matches!(
                SmoteConfig::new(p),
                Err(LearnError::InvalidPercentage { .. })
            ));
        }
        assert!(SmoteConfig::new(0.0).is_ok());
    }

    #[test]
    fn whole_percentages_multiply_the_class() {
        let (features, labels) = imbalanced();
        let out = SmoteConfig::new(200.0)
            .unwrap()
            .resample(&features, &labels, &NUMERIC)
            .unwrap();
        assert_eq!(out.class, 1);
        assert_eq!(out.n_synthetic, 8);
        assert_eq!(out.labels.iter().filter(|&&l| l == 1).count(), 12);
        assert_eq!(out.features.len(), 24);
        assert_eq!(&out.features[..16], &features[..]);
    }

    #[test]
    fn fractional_percentage_rounds_down() {
        let (features, labels) = imbalanced();
        let out = SmoteConfig::new(130.0)
            .unwrap()
            .resample(&features, &labels, &NUMERIC)
            .unwrap();
        // floor(1.3 * 4) = 5
        assert_eq!(out.n_synthetic, 5);
    }

    #[test]
    fn synthetic_rows_lie_between_minority_rows() {
        let (features, labels) = imbalanced();
        let out = SmoteConfig::new(300.0)
            .unwrap()
            .with_k_neighbors(2)
            .resample(&features, &labels, &NUMERIC)
            .unwrap();
        for row in &out.features[16..] {
            assert!((10.0..=13.0).contains(&row[0]), "row = {row:?}");
            assert!((10.0..=11.0).contains(&row[1]), "row = {row:?}");
        }
    }

    #[test]
    fn zero_percentage_is_identity() {
        let (features, labels) = imbalanced();
        let out = SmoteConfig::new(0.0)
            .unwrap()
            .resample(&features, &labels, &NUMERIC)
            .unwrap();
        assert_eq!(out.features, features);
        assert_eq!(out.labels, labels);
    }

    #[test]
    fn explicit_class_is_honored() {
        let (features, labels) = imbalanced();
        let out = SmoteConfig::new(50.0)
            .unwrap()
            .with_class(ClassSelection::Label(0))
            .resample(&features, &labels, &NUMERIC)
            .unwrap();
        assert_eq!(out.class, 0);
        assert_eq!(out.n_synthetic, 6);
    }

    #[test]
    fn missing_class_is_an_error() {
        let (features, labels) = imbalanced();
        let err = SmoteConfig::new(100.0)
            .unwrap()
            .with_class(ClassSelection::Label(3))
            .resample(&features, &labels, &NUMERIC)
            .unwrap_err();
        assert!(matches!(err, LearnError::NoInstancesOfClass { class: 3 }));
    }

    #[test]
    fn single_minority_row_is_copied() {
        let features = vec![vec![0.0], vec![1.0], vec![7.0]];
        let labels = vec![0, 0, 1];
        let out = SmoteConfig::new(200.0)
            .unwrap()
            .resample(&features, &labels, &[FeatureKind::Numeric])
            .unwrap();
        assert_eq!(out.features[3..], [vec![7.0], vec![7.0]]);
    }

    #[test]
    fn nominal_columns_take_the_neighbourhood_majority() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![5.0, 2.0],
            vec![5.1, 1.0],
            vec![5.2, 1.0],
        ];
        let labels = vec![0, 0, 1, 1, 1];
        let kinds = [FeatureKind::Numeric, FeatureKind::Nominal];
        let out = SmoteConfig::new(100.0)
            .unwrap()
            .with_k_neighbors(2)
            .resample(&features, &labels, &kinds)
            .unwrap();
        assert_eq!(out.n_synthetic, 3);
        for row in &out.features[5..] {
            assert_eq!(row[1], 1.0, "row = {row:?}");
        }
    }

    #[test]
    fn same_seed_same_output() {
        let (features, labels) = imbalanced();
        let cfg = SmoteConfig::new(150.0).unwrap().with_seed(9);
        let a = cfg.resample(&features, &labels, &NUMERIC).unwrap();
        let b = cfg.resample(&features, &labels, &NUMERIC).unwrap();
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn kind_count_is_checked() {
        let (features, labels) = imbalanced();
        let err = SmoteConfig::new(100.0)
            .unwrap()
            .resample(&features, &labels, &[FeatureKind::Numeric])
            .unwrap_err();
        assert!(matches!(
            err,
            LearnError::FeatureKindMismatch { expected: 2, got: 1 }
        ));
    }
}
