//! Minority-class analysis and repeated SMOTE + decision tree evaluation.
//!
//! For each dataset file the [`Driver`] averages several [`EvaluationRunner`]
//! runs. A run draws a random stratified holdout, oversamples the minority
//! class of the training split until it matches the majority, fits a tree and
//! scores the held-out fold.

mod adapters;
mod average;
mod classes;
mod driver;
mod error;
mod pipeline;
mod ratio;
mod runner;

pub use adapters::{
    ArffLoader, FilteredClassifier, SmoteResampler, StratifiedHoldout, TreeClassifier, TreeModel,
};
pub use average::{RunEvaluator, average_runs};
pub use classes::{ClassCount, ClassCounts, ClassPartition, minority_value};
pub use driver::{
    DEFAULT_FILES, DEFAULT_RUNS, Driver, DriverConfig, DriverReport, FailedFile, format_line,
    format_metric,
};
pub use error::EvalError;
pub use pipeline::{
    Classifier, DatasetLoader, Model, Resampler, SeedSource, Splitter, TrainTest,
};
pub use ratio::{OversamplingPlan, oversampling_percentage};
pub use runner::{DefaultRunner, EvaluationRunner, EvaluationSettings, MetricVector};
