//! Learning primitives for imbalanced binary evaluation.
//!
//! Information-gain decision trees, confusion-matrix metrics, stratified fold holdout and
//! SMOTE oversampling. Pure math, no I/O: every entry point takes row-major
//! `&[Vec<f64>]` features and zero-based `usize` labels.

mod confusion;
mod error;
mod folds;
mod node;
mod smote;
mod split;
mod tree;

pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::LearnError;
pub use folds::{Holdout, StratifiedFolds};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use smote::{ClassSelection, FeatureKind, Resampled, SmoteConfig};
pub use tree::{DecisionTree, DecisionTreeConfig};
