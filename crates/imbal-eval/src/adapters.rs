//! Concrete collaborators backed by imbal-arff and imbal-learn.

use std::path::Path;

use imbal_arff::{ArffReader, Dataset};
use imbal_learn::{
    ClassSelection, ConfusionMatrix, DecisionTree, DecisionTreeConfig, SmoteConfig,
    StratifiedFolds,
};
use tracing::debug;

use crate::pipeline::{Classifier, DatasetLoader, Model, Resampler, Splitter, TrainTest};
use crate::ratio::OversamplingPlan;
use crate::EvalError;

/// Loads `.arff` files with [`ArffReader`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArffLoader;

impl DatasetLoader for ArffLoader {
    fn load(&self, path: &Path) -> Result<Dataset, EvalError> {
        ArffReader::new(path)
            .read()
            .map_err(|source| EvalError::DatasetLoad {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Stratified k-fold holdout: one fold is the test set, the rest train.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedHoldout {
    n_folds: usize,
    test_fold: usize,
}

impl StratifiedHoldout {
    /// Hold out fold `test_fold` (one-based) of `n_folds`.
    pub fn new(n_folds: usize, test_fold: usize) -> Self {
        Self { n_folds, test_fold }
    }
}

impl Default for StratifiedHoldout {
    fn default() -> Self {
        Self::new(5, 1)
    }
}

impl Splitter for StratifiedHoldout {
    fn split(&self, dataset: &Dataset, seed: u64) -> Result<TrainTest, EvalError> {
        let (_, labels) = dataset.features_and_labels()?;
        let holdout = StratifiedFolds::new(self.n_folds)?
            .with_seed(seed)
            .holdout(&labels, self.test_fold)?;
        debug!(
            seed,
            n_train = holdout.train.len(),
            n_test = holdout.test.len(),
            "stratified holdout"
        );
        Ok(TrainTest {
            train: dataset.subset(&holdout.train),
            test: dataset.subset(&holdout.test),
        })
    }
}

/// SMOTE oversampling of the plan's minority class.
#[derive(Debug, Clone, Copy)]
pub struct SmoteResampler {
    k_neighbors: usize,
    seed: u64,
}

impl SmoteResampler {
    /// Interpolate towards one of `k_neighbors` nearest neighbors, seeded with `seed`.
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }
}

impl Default for SmoteResampler {
    fn default() -> Self {
        Self::new(5, 1)
    }
}

impl Resampler for SmoteResampler {
    fn resample(&self, dataset: &Dataset, plan: &OversamplingPlan) -> Result<Dataset, EvalError> {
        let (features, labels) = dataset.features_and_labels()?;
        let kinds = dataset.feature_kinds()?;
        let out = SmoteConfig::new(plan.percentage)?
            .with_k_neighbors(self.k_neighbors)
            .with_seed(self.seed)
            .with_class(ClassSelection::Label(plan.minority_class()))
            .resample(&features, &labels, &kinds)?;
        debug!(
            class = out.class,
            n_synthetic = out.n_synthetic,
            n_instances = out.labels.len(),
            "training set oversampled"
        );
        Ok(dataset.with_features_and_labels(out.features, &out.labels)?)
    }
}

/// Decision tree induction via [`DecisionTreeConfig`].
#[derive(Debug, Clone, Default)]
pub struct TreeClassifier {
    config: DecisionTreeConfig,
}

impl TreeClassifier {
    /// Fit trees with `config`.
    pub fn new(config: DecisionTreeConfig) -> Self {
        Self { config }
    }
}

/// A fitted [`TreeClassifier`].
#[derive(Debug)]
pub struct TreeModel {
    tree: DecisionTree,
    n_classes: usize,
}

impl TreeModel {
    /// The underlying tree.
    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }
}

impl Classifier for TreeClassifier {
    type Model = TreeModel;

    fn fit(&self, train: &Dataset) -> Result<TreeModel, EvalError> {
        let (features, labels) = train.features_and_labels()?;
        let tree = self.config.fit(&features, &labels)?;
        let n_classes = train
            .class_attribute()
            .and_then(|a| a.labels())
            .map_or(tree.n_classes(), <[String]>::len);
        debug!(
            n_nodes = tree.n_nodes(),
            depth = tree.depth(),
            "tree fitted"
        );
        Ok(TreeModel { tree, n_classes })
    }
}

impl Model for TreeModel {
    fn evaluate(&self, test: &Dataset) -> Result<ConfusionMatrix, EvalError> {
        let (features, labels) = test.features_and_labels()?;
        let predicted = self.tree.predict_batch(&features)?;
        Ok(ConfusionMatrix::from_labels(&labels, &predicted, self.n_classes)?)
    }
}

/// Applies a [`Resampler`] to the training set before fitting the inner
/// classifier. The returned model is the inner model, so test data is
/// scored unmodified.
#[derive(Debug, Clone)]
pub struct FilteredClassifier<C, R> {
    inner: C,
    resampler: R,
    plan: OversamplingPlan,
}

impl<C, R> FilteredClassifier<C, R> {
    /// Wrap `inner` so that training data passes through `resampler` with `plan`.
    pub fn new(inner: C, resampler: R, plan: OversamplingPlan) -> Self {
        Self {
            inner,
            resampler,
            plan,
        }
    }
}

impl<C: Classifier, R: Resampler> Classifier for FilteredClassifier<C, R> {
    type Model = C::Model;

    fn fit(&self, train: &Dataset) -> Result<C::Model, EvalError> {
        let resampled = self.resampler.resample(train, &self.plan)?;
        self.inner.fit(&resampled)
    }
}
