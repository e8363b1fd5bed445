//! Confusion matrix and per-class classification metrics.

use std::fmt;

use crate::error::LearnError;

/// Confusion matrix: `matrix[true_class][predicted_class]` counts samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

/// Per-class precision, recall and F-measure.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    /// The class index.
    pub class: usize,
    /// TP / (TP + FP); 0.0 when nothing was predicted as this class.
    pub precision: f64,
    /// TP / (TP + FN); 0.0 when the class has no true samples.
    pub recall: f64,
    /// Harmonic mean of precision and recall; 0.0 when both are zero.
    pub f_measure: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`LearnError::EmptyDataset`] | Zero labels provided |
    /// | [`LearnError::LabelCountMismatch`] | Slices differ in length |
    /// | [`LearnError::LabelOutOfRange`] | A label is `>= n_classes` |
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, LearnError> {
        if true_labels.is_empty() {
            return Err(LearnError::EmptyDataset);
        }
        if predicted.len() != true_labels.len() {
            return Err(LearnError::LabelCountMismatch {
                n_samples: true_labels.len(),
                n_labels: predicted.len(),
            });
        }
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (position, (&t, &p)) in true_labels.iter().zip(predicted).enumerate() {
            if let Some(label) = [t, p].into_iter().find(|&l| l >= n_classes) {
                return Err(LearnError::LabelOutOfRange {
                    label,
                    position,
                    n_classes,
                });
            }
            matrix[t][p] += 1;
        }
        Ok(Self { matrix, n_classes })
    }

    /// Total number of evaluated samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes).map(|i| self.matrix[i][i]).sum();
        match self.total() {
            0 => 0.0,
            total => correct as f64 / total as f64,
        }
    }

    /// Proportion of incorrect predictions, `1 - accuracy`.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        1.0 - self.accuracy()
    }

    /// Metrics for one class. Classes outside the matrix report all zeros.
    #[must_use]
    pub fn metrics_for(&self, class: usize) -> ClassMetrics {
        if class >= self.n_classes {
            return ClassMetrics {
                class,
                precision: 0.0,
                recall: 0.0,
                f_measure: 0.0,
                support: 0,
            };
        }
        let tp = self.matrix[class][class];
        let predicted: usize = self.matrix.iter().map(|row| row[class]).sum();
        let support: usize = self.matrix[class].iter().sum();
        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f_measure = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassMetrics {
            class,
            precision,
            recall,
            f_measure,
            support,
        }
    }

    /// Metrics for every class in index order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes).map(|c| self.metrics_for(c)).collect()
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for j in 0..self.n_classes {
            write!(f, " pred_{j:>3}")?;
        }
        writeln!(f)?;
        for (i, row) in self.matrix.iter().enumerate() {
            write!(f, "true_{i:>3}")?;
            for val in row {
                write!(f, " {val:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
