//! Stratified fold holdout: one fold becomes the test set, the rest train.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::LearnError;

/// Stratified k-fold assignment.
///
/// Construct via [`StratifiedFolds::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone)]
pub struct StratifiedFolds {
    n_folds: usize,
    seed: u64,
}

/// Row indices of one train/test holdout, each in original row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holdout {
    /// Rows outside the selected fold.
    pub train: Vec<usize>,
    /// Rows of the selected fold.
    pub test: Vec<usize>,
}

impl StratifiedFolds {
    /// Create a fold assigner with `n_folds` folds.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, LearnError> {
        if n_folds < 2 {
            return Err(LearnError::InvalidFoldCount { n_folds });
        }
        Ok(Self { n_folds, seed: 1 })
    }

    /// Set the seed of the shuffle that precedes stratification.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Assign each row a zero-based fold.
    ///
    /// Rows are shuffled, grouped by class (ascending label, shuffled order
    /// within a class) and dealt round-robin across folds without restarting
    /// at each class, so every fold receives each class in proportion and
    /// fold sizes differ by at most one.
    #[must_use]
    pub fn assign(&self, labels: &[usize]) -> Vec<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..labels.len()).collect();
        order.shuffle(&mut rng);
        // Stable sort keeps the shuffled order inside each class.
        order.sort_by_key(|&i| labels[i]);

        let mut folds = vec![0usize; labels.len()];
        for (position, &row) in order.iter().enumerate() {
            folds[row] = position % self.n_folds;
        }
        folds
    }

    /// Split rows into the one-based `fold` (test) and everything else (train).
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::InvalidFoldIndex`] unless `1 <= fold <= n_folds`.
    #[instrument(skip(self, labels), fields(n_folds = self.n_folds, seed = self.seed))]
    pub fn holdout(&self, labels: &[usize], fold: usize) -> Result<Holdout, LearnError> {
        if fold == 0 || fold > self.n_folds {
            return Err(LearnError::InvalidFoldIndex {
                fold,
                n_folds: self.n_folds,
            });
        }
        let assignment = self.assign(labels);
        let (test, train): (Vec<usize>, Vec<usize>) =
            (0..labels.len()).partition(|&i| assignment[i] == fold - 1);
        debug!(n_train = train.len(), n_test = test.len(), "holdout split");
        Ok(Holdout { train, test })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced(n_major: usize, n_minor: usize) -> Vec<usize> {
        let mut labels = vec![0; n_major];
        labels.extend(vec![1; n_minor]);
        labels
    }

    #[test]
    fn invalid_fold_count() {
        assert!(StratifiedFolds::new(0).is_err());
        assert!(StratifiedFolds::new(1).is_err());
        assert!(StratifiedFolds::new(2).is_ok());
    }

    #[test]
    fn fold_index_is_one_based() {
        let folds = StratifiedFolds::new(5).unwrap();
        let labels = imbalanced(10, 5);
        assert!(matches!(
            folds.holdout(&labels, 0),
            Err(LearnError::InvalidFoldIndex { fold: 0, n_folds: 5 })
        ));
        assert!(folds.holdout(&labels, 6).is_err());
        assert!(folds.holdout(&labels, 5).is_ok());
    }

    #[test]
    fn holdout_preserves_class_proportions() {
        let labels = imbalanced(80, 20);
        for seed in 1..=50 {
            let split = StratifiedFolds::new(5)
                .unwrap()
                .with_seed(seed)
                .holdout(&labels, 1)
                .unwrap();
            let test_minor = split.test.iter().filter(|&&i| labels[i] == 1).count();
            let train_minor = split.train.iter().filter(|&&i| labels[i] == 1).count();
            assert_eq!(split.test.len(), 20);
            assert_eq!(test_minor, 4);
            assert_eq!(train_minor, 16);
            assert_eq!(split.train.len() - train_minor, 64);
        }
    }

    #[test]
    fn holdout_is_a_partition_in_row_order() {
        let labels = vec![2, 0, 1, 1, 0, 2, 2, 0, 1, 0, 0, 1, 2];
        let split = StratifiedFolds::new(3)
            .unwrap()
            .with_seed(9)
            .holdout(&labels, 2)
            .unwrap();
        assert!(split.train.windows(2).all(|w| w[0] < w[1]));
        assert!(split.test.windows(2).all(|w| w[0] < w[1]));
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..labels.len()).collect::<Vec<_>>());
    }

    #[test]
    fn fold_sizes_differ_by_at_most_one() {
        let labels = vec![0, 0, 0, 1, 1, 2, 2, 2, 2, 1, 0];
        let assignment = StratifiedFolds::new(4).unwrap().with_seed(3).assign(&labels);
        let mut sizes = [0usize; 4];
        for f in assignment {
            sizes[f] += 1;
        }
        let min = sizes.iter().min().unwrap();
        let max = sizes.iter().max().unwrap();
        assert!(max - min <= 1, "sizes = {sizes:?}");
    }

    #[test]
    fn same_seed_same_split() {
        let labels = imbalanced(30, 7);
        let a = StratifiedFolds::new(5).unwrap().with_seed(17).holdout(&labels, 1).unwrap();
        let b = StratifiedFolds::new(5).unwrap().with_seed(17).holdout(&labels, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rare_class_is_allowed() {
        // Fewer minority rows than folds: some folds get none.
        let labels = imbalanced(20, 2);
        let split = StratifiedFolds::new(5).unwrap().holdout(&labels, 1).unwrap();
        assert_eq!(split.train.len() + split.test.len(), 22);
    }
}
