//! Collaborator seams of an evaluation run.
//!
//! Each stage the runner delegates to (loading, splitting, resampling,
//! training, scoring and seed drawing) sits behind a trait so the
//! orchestration can be exercised with stand-ins.

use std::path::Path;

use imbal_arff::Dataset;
use imbal_learn::ConfusionMatrix;
use rand::Rng;

use crate::ratio::OversamplingPlan;
use crate::EvalError;

/// Loads a labeled dataset from a file.
pub trait DatasetLoader {
    /// Load `path`. Failures are reported as [`EvalError::DatasetLoad`].
    fn load(&self, path: &Path) -> Result<Dataset, EvalError>;
}

/// A held-out split of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTest {
    /// Instances used for fitting.
    pub train: Dataset,
    /// Held-out instances used for scoring.
    pub test: Dataset,
}

/// Splits a dataset into training and test subsets.
pub trait Splitter {
    /// Split `dataset` using `seed` for any randomization.
    fn split(&self, dataset: &Dataset, seed: u64) -> Result<TrainTest, EvalError>;
}

/// Rebalances a training set according to an [`OversamplingPlan`].
pub trait Resampler {
    /// Return `dataset` with synthetic instances added.
    fn resample(&self, dataset: &Dataset, plan: &OversamplingPlan) -> Result<Dataset, EvalError>;
}

/// Trains a [`Model`] from a labeled dataset.
pub trait Classifier {
    /// The fitted model type.
    type Model: Model;

    /// Fit on `train`.
    fn fit(&self, train: &Dataset) -> Result<Self::Model, EvalError>;
}

/// A fitted model that can be scored against labeled data.
pub trait Model {
    /// Predict every instance of `test` and tabulate against its labels.
    fn evaluate(&self, test: &Dataset) -> Result<ConfusionMatrix, EvalError>;
}

/// Source of split seeds.
pub trait SeedSource {
    /// Next integer in `low..=high`.
    fn next_in_range(&mut self, low: u64, high: u64) -> u64;
}

impl<R: Rng + ?Sized> SeedSource for R {
    fn next_in_range(&mut self, low: u64, high: u64) -> u64 {
        self.gen_range(low..=high)
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    type Model = C::Model;

    fn fit(&self, train: &Dataset) -> Result<Self::Model, EvalError> {
        (**self).fit(train)
    }
}

impl<R: Resampler + ?Sized> Resampler for &R {
    fn resample(&self, dataset: &Dataset, plan: &OversamplingPlan) -> Result<Dataset, EvalError> {
        (**self).resample(dataset, plan)
    }
}
