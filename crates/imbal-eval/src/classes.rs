//! Class counting, minority selection and minority/majority partitioning.

use std::collections::BTreeMap;

use imbal_arff::{Dataset, IoError};

use crate::EvalError;

/// One entry of a [`ClassCounts`] map.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCount {
    /// Canonical string form of the class value, e.g. `"1.0"`.
    pub key: String,
    /// The class value itself.
    pub value: f64,
    /// Number of instances carrying this value.
    pub count: usize,
}

/// Occurrences of each class value in a dataset, keyed by canonical string.
///
/// Keys are compared as strings, so `"10.0"` sorts before `"2.0"`. That
/// ordering decides ties in [`ClassCounts::minority`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCounts {
    counts: BTreeMap<String, (f64, usize)>,
}

impl ClassCounts {
    /// Count every instance's class value once.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::MissingClassIndex`] | no class attribute is set |
    /// | [`EvalError::EmptyDataset`] | the dataset has zero instances |
    pub fn from_dataset(dataset: &Dataset) -> Result<Self, EvalError> {
        let values = dataset.class_values().map_err(missing_class)?;
        let mut counts = BTreeMap::new();
        for value in values {
            counts
                .entry(canonical_key(value))
                .or_insert((value, 0))
                .1 += 1;
        }
        if counts.is_empty() {
            return Err(EvalError::EmptyDataset);
        }
        Ok(Self { counts })
    }

    /// Entries sorted by count ascending. The sort is stable, so tied counts
    /// stay in key order.
    pub fn ascending(&self) -> Vec<ClassCount> {
        let mut entries: Vec<ClassCount> = self
            .counts
            .iter()
            .map(|(key, &(value, count))| ClassCount {
                key: key.clone(),
                value,
                count,
            })
            .collect();
        entries.sort_by_key(|e| e.count);
        entries
    }

    /// Class value with the fewest instances; the first key in sorted-key
    /// order among tied counts.
    pub fn minority(&self) -> f64 {
        self.ascending().first().map_or(f64::NAN, |e| e.value)
    }

    /// Number of instances with `value`, zero if absent.
    pub fn count_of(&self, value: f64) -> usize {
        self.counts.get(&canonical_key(value)).map_or(0, |&(_, c)| c)
    }

    /// Number of distinct class values.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Always false: construction rejects empty datasets.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Class value with the fewest instances in `dataset`.
///
/// # Errors
///
/// As for [`ClassCounts::from_dataset`].
pub fn minority_value(dataset: &Dataset) -> Result<f64, EvalError> {
    Ok(ClassCounts::from_dataset(dataset)?.minority())
}

/// A dataset split into instances of the minority class and all others.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPartition {
    /// Instances whose class value equals the minority value.
    pub minority: Dataset,
    /// Every other instance.
    pub majority: Dataset,
}

impl ClassPartition {
    /// Partition `dataset` by `minority_value`, preserving order on each side.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MissingClassIndex`] if no class attribute is set.
    pub fn split(dataset: &Dataset, minority_value: f64) -> Result<Self, EvalError> {
        let values = dataset.class_values().map_err(missing_class)?;
        let mut minority = dataset.empty_like();
        let mut majority = dataset.empty_like();
        for (row, value) in dataset.rows().iter().zip(values) {
            if value == minority_value {
                minority.push(row.clone());
            } else {
                majority.push(row.clone());
            }
        }
        Ok(Self { minority, majority })
    }

    /// Select the minority value of `dataset`, then partition by it.
    ///
    /// # Errors
    ///
    /// As for [`ClassCounts::from_dataset`].
    pub fn of(dataset: &Dataset) -> Result<Self, EvalError> {
        let minority = minority_value(dataset)?;
        Self::split(dataset, minority)
    }
}

/// `{:?}` gives the shortest round-trip form with a decimal point, so equal
/// values always share a key.
fn canonical_key(value: f64) -> String {
    format!("{value:?}")
}

fn missing_class(err: IoError) -> EvalError {
    match err {
        IoError::MissingClassIndex { relation } => EvalError::MissingClassIndex { relation },
        other => EvalError::Dataset(other),
    }
}
