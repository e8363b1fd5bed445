//! One randomized evaluation of one dataset file.

use std::ops::{AddAssign, RangeInclusive};
use std::path::Path;

use imbal_arff::Dataset;
use imbal_learn::{ConfusionMatrix, DecisionTreeConfig};
use tracing::{debug, instrument};

use crate::adapters::{
    ArffLoader, FilteredClassifier, SmoteResampler, StratifiedHoldout, TreeClassifier,
};
use crate::average::RunEvaluator;
use crate::pipeline::{Classifier, DatasetLoader, Model, Resampler, SeedSource, Splitter};
use crate::ratio::OversamplingPlan;
use crate::EvalError;

/// Per-class precision, recall and F-measure for labels 0 and 1, then accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricVector([f64; MetricVector::LEN]);

impl MetricVector {
    /// Number of components.
    pub const LEN: usize = 7;

    /// Wrap raw components.
    pub fn new(values: [f64; Self::LEN]) -> Self {
        Self(values)
    }

    /// All components zero.
    pub fn zero() -> Self {
        Self([0.0; Self::LEN])
    }

    /// Extract the vector from a two-class confusion matrix. Accuracy is
    /// `1 - error_rate`.
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let c0 = cm.metrics_for(0);
        let c1 = cm.metrics_for(1);
        Self([
            c0.precision,
            c0.recall,
            c0.f_measure,
            c1.precision,
            c1.recall,
            c1.f_measure,
            1.0 - cm.error_rate(),
        ])
    }

    /// The components.
    pub fn values(&self) -> &[f64; Self::LEN] {
        &self.0
    }

    /// Every component divided by `divisor`.
    #[must_use]
    pub fn scaled_down(self, divisor: f64) -> Self {
        Self(self.0.map(|v| v / divisor))
    }
}

impl AddAssign for MetricVector {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

/// Fixed parameters of an evaluation run.
///
/// # Defaults
///
/// | Parameter     | Default                     |
/// |---------------|-----------------------------|
/// | `n_folds`     | 5                           |
/// | `test_fold`   | 1                           |
/// | `seed_range`  | `1..=50`                    |
/// | `k_neighbors` | 5                           |
/// | `smote_seed`  | 1                           |
/// | `tree`        | [`DecisionTreeConfig::new`] |
#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    /// Number of stratified folds.
    pub n_folds: usize,
    /// One-based fold held out for testing.
    pub test_fold: usize,
    /// Range split seeds are drawn from.
    pub seed_range: RangeInclusive<u64>,
    /// SMOTE neighbor count.
    pub k_neighbors: usize,
    /// SMOTE random seed.
    pub smote_seed: u64,
    /// Decision tree settings.
    pub tree: DecisionTreeConfig,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            n_folds: 5,
            test_fold: 1,
            seed_range: 1..=50,
            k_neighbors: 5,
            smote_seed: 1,
            tree: DecisionTreeConfig::new(),
        }
    }
}

/// Load, split, oversample, train and score one dataset file.
///
/// Generic over its collaborators; [`EvaluationRunner::with_settings`] wires
/// the file reader, stratified holdout, SMOTE and decision tree.
pub struct EvaluationRunner<L, S, C, R, Src> {
    loader: L,
    splitter: S,
    classifier: C,
    resampler: R,
    seeds: Src,
    seed_range: RangeInclusive<u64>,
}

/// The runner used by the command line.
pub type DefaultRunner<Src> =
    EvaluationRunner<ArffLoader, StratifiedHoldout, TreeClassifier, SmoteResampler, Src>;

impl<Src: SeedSource> DefaultRunner<Src> {
    /// Build the standard pipeline from `settings`, drawing split seeds from `seeds`.
    pub fn with_settings(settings: EvaluationSettings, seeds: Src) -> Self {
        EvaluationRunner::new(
            ArffLoader,
            StratifiedHoldout::new(settings.n_folds, settings.test_fold),
            TreeClassifier::new(settings.tree),
            SmoteResampler::new(settings.k_neighbors, settings.smote_seed),
            seeds,
        )
        .with_seed_range(settings.seed_range)
    }
}

impl<L, S, C, R, Src> EvaluationRunner<L, S, C, R, Src>
where
    L: DatasetLoader,
    S: Splitter,
    C: Classifier,
    R: Resampler,
    Src: SeedSource,
{
    /// Assemble a runner from its collaborators. Split seeds are drawn from `1..=50`.
    pub fn new(loader: L, splitter: S, classifier: C, resampler: R, seeds: Src) -> Self {
        Self {
            loader,
            splitter,
            classifier,
            resampler,
            seeds,
            seed_range: 1..=50,
        }
    }

    /// Draw split seeds from `range` instead.
    #[must_use]
    pub fn with_seed_range(mut self, range: RangeInclusive<u64>) -> Self {
        self.seed_range = range;
        self
    }
}

impl<L, S, C, R, Src> RunEvaluator for EvaluationRunner<L, S, C, R, Src>
where
    L: DatasetLoader,
    S: Splitter,
    C: Classifier,
    R: Resampler,
    Src: SeedSource,
{
    /// Produce one [`MetricVector`] for one random holdout of `path`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::DatasetLoad`] | the file is missing or malformed |
    /// | [`EvalError::UnsupportedClassAttribute`] | the class is not a two-label nominal attribute |
    /// | [`EvalError::EmptyDataset`] | the training split is empty |
    /// | [`EvalError::InsufficientMinorityInstances`] | the training split has no minority rows |
    /// | [`EvalError::Learn`] | splitting, oversampling or training fails |
    #[instrument(skip(self), fields(path = %path.display()))]
    fn evaluate_once(&mut self, path: &Path) -> Result<MetricVector, EvalError> {
        let mut dataset = self.loader.load(path)?;
        dataset.set_class_to_last()?;
        require_binary_class(&dataset, path)?;
        let n_missing = dataset.n_missing();
        if n_missing > 0 {
            dataset = dataset.replace_missing()?;
            debug!(n_missing, n_instances = dataset.n_instances(), "missing values filled");
        }

        let seed = self
            .seeds
            .next_in_range(*self.seed_range.start(), *self.seed_range.end());
        let split = self.splitter.split(&dataset, seed)?;
        debug!(
            seed,
            n_train = split.train.n_instances(),
            n_test = split.test.n_instances(),
            "split drawn"
        );

        let plan = OversamplingPlan::for_train(&split.train)?;
        let model = FilteredClassifier::new(&self.classifier, &self.resampler, plan)
            .fit(&split.train)?;
        let cm = model.evaluate(&split.test)?;

        let metrics = MetricVector::from_confusion(&cm);
        debug!(?metrics, "run scored");
        Ok(metrics)
    }
}

fn require_binary_class(dataset: &Dataset, path: &Path) -> Result<(), EvalError> {
    let Some(attribute) = dataset.class_attribute() else {
        return Err(EvalError::MissingClassIndex {
            relation: dataset.relation().to_string(),
        });
    };
    let n_labels = attribute.labels().map_or(0, <[String]>::len);
    if n_labels != 2 {
        return Err(EvalError::UnsupportedClassAttribute {
            path: path.to_path_buf(),
            name: attribute.name().to_string(),
            n_labels,
        });
    }
    Ok(())
}
