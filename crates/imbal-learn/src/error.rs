/// Errors from tree induction, evaluation, fold splitting and oversampling.
#[derive(Debug, thiserror::Error)]
pub enum LearnError {
    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when n_folds is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid n_folds value provided.
        n_folds: usize,
    },

    /// Returned when the selected fold is outside `1..=n_folds`.
    #[error("fold must be in [1, {n_folds}], got {fold}")]
    InvalidFoldIndex {
        /// The requested one-based fold.
        fold: usize,
        /// The configured number of folds.
        n_folds: usize,
    },

    /// Returned when the dataset has zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when the dataset has zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the label slice length differs from the number of samples.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of samples (feature rows or true labels).
        n_samples: usize,
        /// Number of labels provided.
        n_labels: usize,
    },

    /// Returned when a label is not a valid class index.
    #[error("label {label} at position {position} is out of range for {n_classes} classes")]
    LabelOutOfRange {
        /// The offending label.
        label: usize,
        /// Zero-based position of the label.
        position: usize,
        /// Number of classes expected.
        n_classes: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when the oversampling percentage is negative, NaN or infinite.
    #[error("oversampling percentage must be finite and non-negative, got {percentage}")]
    InvalidPercentage {
        /// The rejected percentage.
        percentage: f64,
    },

    /// Returned when the nearest-neighbour count is zero.
    #[error("k_neighbors must be at least 1, got {k_neighbors}")]
    InvalidNeighborCount {
        /// The invalid neighbour count.
        k_neighbors: usize,
    },

    /// Returned when the class selected for oversampling has no samples.
    #[error("class {class} has no samples to oversample")]
    NoInstancesOfClass {
        /// The selected class label.
        class: usize,
    },

    /// Returned when the feature-kind slice does not match the feature count.
    #[error("got {got} feature kinds, expected {expected}")]
    FeatureKindMismatch {
        /// The number of feature columns.
        expected: usize,
        /// The number of kinds provided.
        got: usize,
    },
}
