use std::path::PathBuf;

use imbal_arff::IoError;
use imbal_learn::LearnError;

/// Errors from class analysis, evaluation runs and result output.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Returned when class counting is asked to inspect zero instances.
    #[error("cannot select a minority class from an empty dataset")]
    EmptyDataset,

    /// Returned when a dataset has no class attribute set.
    #[error("dataset {relation} has no class attribute")]
    MissingClassIndex {
        /// Relation name of the dataset.
        relation: String,
    },

    /// Returned when the oversampling ratio would divide by a zero minority count.
    #[error("minority subset is empty (majority has {majority} instances); oversampling ratio is undefined")]
    InsufficientMinorityInstances {
        /// Size of the majority subset.
        majority: usize,
    },

    /// Returned when averaging is asked for zero runs.
    #[error("run count must be at least 1, got {runs}")]
    InvalidRunCount {
        /// The invalid run count.
        runs: usize,
    },

    /// Returned when the class attribute is not a two-valued nominal attribute.
    #[error("class attribute {name} of {path} must be nominal with exactly 2 labels, found {n_labels}")]
    UnsupportedClassAttribute {
        /// Dataset file.
        path: PathBuf,
        /// Class attribute name.
        name: String,
        /// Number of declared labels (0 for a numeric attribute).
        n_labels: usize,
    },

    /// Returned when a dataset file cannot be loaded.
    #[error("failed to load dataset {path}")]
    DatasetLoad {
        /// Dataset file.
        path: PathBuf,
        /// Underlying reader error.
        source: IoError,
    },

    /// Returned when an in-memory dataset operation fails.
    #[error(transparent)]
    Dataset(#[from] IoError),

    /// Returned when splitting, resampling or training fails.
    #[error(transparent)]
    Learn(#[from] LearnError),

    /// Returned when a result line cannot be written.
    #[error("failed to write results")]
    Output(#[source] std::io::Error),
}
