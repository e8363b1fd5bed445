//! Oversampling percentage for balancing a training set.

use imbal_arff::Dataset;
use tracing::debug;

use crate::classes::{ClassPartition, minority_value};
use crate::EvalError;

/// Percentage of synthetic minority instances, relative to the minority
/// count, that brings the minority up to the majority: `(majority / minority - 1) * 100`.
///
/// # Errors
///
/// Returns [`EvalError::InsufficientMinorityInstances`] if `minority` is zero.
pub fn oversampling_percentage(majority: usize, minority: usize) -> Result<f64, EvalError> {
    if minority == 0 {
        return Err(EvalError::InsufficientMinorityInstances { majority });
    }
    Ok(((majority as f64 / minority as f64) - 1.0) * 100.0)
}

/// Minority class of a training set and how much to oversample it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OversamplingPlan {
    /// Class value selected as the minority.
    pub minority_value: f64,
    /// Instances with the minority value.
    pub n_minority: usize,
    /// All other instances.
    pub n_majority: usize,
    /// Oversampling percentage from [`oversampling_percentage`].
    pub percentage: f64,
}

impl OversamplingPlan {
    /// Select the minority of `train`, partition it and compute the percentage.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::EmptyDataset`] | `train` has zero instances |
    /// | [`EvalError::MissingClassIndex`] | no class attribute is set |
    pub fn for_train(train: &Dataset) -> Result<Self, EvalError> {
        let minority_value = minority_value(train)?;
        let partition = ClassPartition::split(train, minority_value)?;
        let n_minority = partition.minority.n_instances();
        let n_majority = partition.majority.n_instances();
        let percentage = oversampling_percentage(n_majority, n_minority)?;
        debug!(minority_value, n_minority, n_majority, percentage, "oversampling plan");
        Ok(Self {
            minority_value,
            n_minority,
            n_majority,
            percentage,
        })
    }

    /// The minority value as a zero-based nominal label index.
    pub fn minority_class(&self) -> usize {
        self.minority_value as usize
    }
}
