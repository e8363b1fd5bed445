//! I/O error types for imbal-arff.

use std::path::PathBuf;

/// Errors from reading attribute-relation files and handling datasets.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or cannot be opened.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading an opened file fails.
    #[error("cannot read {path}")]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a header line cannot be understood.
    #[error("malformed header in {path} at line {line}: {reason}")]
    MalformedHeader {
        /// Path to the file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Returned for attribute types other than numeric and nominal.
    #[error("unsupported attribute type \"{kind}\" for {name} in {path} at line {line}")]
    UnsupportedAttributeType {
        /// Path to the file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Attribute name.
        name: String,
        /// The declared type.
        kind: String,
    },

    /// Returned when two attributes share a name.
    #[error("duplicate attribute \"{name}\" in {path} at line {line}")]
    DuplicateAttribute {
        /// Path to the file.
        path: PathBuf,
        /// One-based line number of the second declaration.
        line: usize,
        /// The duplicated name.
        name: String,
    },

    /// Returned when the header declares no attributes.
    #[error("no attributes declared in {path}")]
    NoAttributes {
        /// Path to the file.
        path: PathBuf,
    },

    /// Returned when the file has no `@data` line.
    #[error("missing @data section in {path}")]
    MissingDataSection {
        /// Path to the file.
        path: PathBuf,
    },

    /// Returned when the data section is not valid comma-separated text.
    #[error("CSV parse error in {path} data section at byte offset {offset}")]
    CsvParse {
        /// Path to the file.
        path: PathBuf,
        /// Byte offset inside the data section.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a data row has a different number of values than attributes.
    #[error("inconsistent row length in {path}: row {row_index} has {got} values, expected {expected}")]
    InconsistentRowLength {
        /// Path to the file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
        /// Number of declared attributes.
        expected: usize,
        /// Values found in the row.
        got: usize,
    },

    /// Returned when a numeric cell is NaN, infinite or unparseable.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
        /// Zero-based attribute index.
        col_index: usize,
        /// The raw cell text.
        raw: String,
    },

    /// Returned when a nominal cell is not one of the declared labels.
    #[error("unknown value \"{raw}\" for nominal attribute {attribute} in {path}, row {row_index}")]
    UnknownNominalValue {
        /// Path to the file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
        /// Attribute name.
        attribute: String,
        /// The raw cell text.
        raw: String,
    },

    /// Returned for sparse `{index value, ...}` rows.
    #[error("sparse data rows are not supported ({path}, row {row_index})")]
    SparseRowUnsupported {
        /// Path to the file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
    },

    /// Returned when a class index is outside the attribute range.
    #[error("class index {index} out of range for {n_attributes} attributes")]
    InvalidClassIndex {
        /// The requested index.
        index: usize,
        /// Number of attributes.
        n_attributes: usize,
    },

    /// Returned when an operation needs a class attribute and none is set.
    #[error("dataset {relation} has no class attribute set")]
    MissingClassIndex {
        /// Relation name of the dataset.
        relation: String,
    },

    /// Returned when a class cell is not a valid nominal label index.
    #[error("row {row_index} has class value {value}, not a label of a {n_labels}-valued nominal attribute")]
    InvalidClassValue {
        /// Zero-based row index.
        row_index: usize,
        /// The stored class value.
        value: f64,
        /// Number of declared labels (0 for numeric class attributes).
        n_labels: usize,
    },
}
