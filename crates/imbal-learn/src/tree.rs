use tracing::{debug, instrument};

use crate::{
    LearnError,
    node::{Node, NodeIndex},
    split::{entropy, find_best_split},
};

/// Configuration for a binary-split information-gain decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default            |
/// |---------------------|--------------------|
/// | `max_depth`         | `None` (unlimited) |
/// | `min_samples_split` | 2                  |
/// | `min_samples_leaf`  | 2                  |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
}

impl DecisionTreeConfig {
    /// Create a config with information-gain splitting and at least two
    /// samples per leaf.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 2,
        }
    }

    /// Set the maximum tree depth (root is depth 0). `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required in each leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Train a decision tree on a row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]`, `labels[sample_idx]` zero-based.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`LearnError::EmptyDataset`] | `features` is empty |
    /// | [`LearnError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`LearnError::ZeroFeatures`] | rows have zero columns |
    /// | [`LearnError::FeatureCountMismatch`] | rows have inconsistent lengths |
    /// | [`LearnError::NonFiniteValue`] | any value is NaN or infinite |
    /// | [`LearnError::InvalidMaxDepth`] | `max_depth` is `Some(0)` |
    /// | [`LearnError::InvalidMinSamplesSplit`] | `min_samples_split < 2` |
    /// | [`LearnError::InvalidMinSamplesLeaf`] | `min_samples_leaf < 1` |
    #[instrument(skip(self, features, labels), fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, LearnError> {
        let n_features = validate_matrix(features, labels)?;

        if let Some(d) = self.max_depth
            && d == 0
        {
            return Err(LearnError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(LearnError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(LearnError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }

        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|f| features.iter().map(|row| row[f]).collect())
            .collect();

        let mut builder = TreeBuilder {
            columns: &columns,
            labels,
            n_classes,
            config: self,
            arena: Vec::new(),
        };
        let all: Vec<usize> = (0..features.len()).collect();
        builder.grow(&all, 0);
        let nodes = builder.arena;

        debug!(
            n_features,
            n_classes,
            n_nodes = nodes.len(),
            "decision tree built"
        );

        Ok(DecisionTree {
            nodes,
            n_features,
            n_classes,
        })
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Check shape and finiteness; return the feature count.
pub(crate) fn validate_matrix(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, LearnError> {
    if features.is_empty() {
        return Err(LearnError::EmptyDataset);
    }
    if labels.len() != features.len() {
        return Err(LearnError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(LearnError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(LearnError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(LearnError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Recursive growth state; nodes are appended to `arena` in pre-order.
struct TreeBuilder<'a> {
    columns: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    config: &'a DecisionTreeConfig,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, samples: &[usize], depth: usize) -> NodeIndex {
        let n_samples = samples.len();
        let mut counts = vec![0usize; self.n_classes];
        for &si in samples {
            counts[self.labels[si]] += 1;
        }

        let impurity = entropy(&counts, n_samples);
        let at_depth_limit = self.config.max_depth.is_some_and(|d| depth >= d);
        let stop = impurity.is_pure() || at_depth_limit || n_samples < self.config.min_samples_split;

        let split = if stop {
            None
        } else {
            find_best_split(
                self.columns,
                self.labels,
                samples,
                self.n_classes,
                self.config.min_samples_leaf,
            )
        };

        let Some(split) = split else {
            return self.push(leaf(&counts, n_samples));
        };

        debug!(
            depth,
            feature = %split.feature,
            threshold = split.threshold,
            gain = split.gain,
            "node split"
        );

        // Reserve this node's slot so children get later indices.
        let idx = self.push(leaf(&counts, n_samples));
        let left = self.grow(&split.left_indices, depth + 1);
        let right = self.grow(&split.right_indices, depth + 1);
        self.arena[idx.index()] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples,
        };
        idx
    }

    fn push(&mut self, node: Node) -> NodeIndex {
        self.arena.push(node);
        NodeIndex::new(self.arena.len() - 1)
    }
}

/// Leaf predicting the most frequent class; ties go to the lowest label.
fn leaf(counts: &[usize], n_samples: usize) -> Node {
    let mut prediction = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[prediction] {
            prediction = class;
        }
    }
    Node::Leaf {
        prediction,
        n_samples,
    }
}

/// A fitted decision tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

impl DecisionTree {
    /// Predict the class label for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, LearnError> {
        match self.leaf_for(sample)? {
            Node::Leaf { prediction, .. } => Ok(*prediction),
            Node::Split { .. } => unreachable!("leaf_for always ends at a leaf"),
        }
    }

    /// Predict every row of `features` in order.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::PredictionFeatureMismatch`] for the first row of the wrong width.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, LearnError> {
        features.iter().map(|row| self.predict(row)).collect()
    }

    /// Borrow the node arena; index 0 is the root.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the total number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the number of classes seen during training.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of feature columns expected at prediction time.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the maximum depth; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        max_depth
    }

    fn leaf_for(&self, sample: &[f64]) -> Result<&Node, LearnError> {
        if sample.len() != self.n_features {
            return Err(LearnError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                node @ Node::Leaf { .. } => return Ok(node),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }
}
