//! Domain types for imbal-arff.

use std::fmt;

use imbal_learn::FeatureKind;

use crate::IoError;

/// Stored value of a `?` cell.
pub const MISSING: f64 = f64::NAN;

/// True for the stored form of a `?` cell.
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Declared type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// Real-valued.
    Numeric,
    /// One of a fixed list of labels; stored values are label indices.
    Nominal(Vec<String>),
}

/// A named column of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
}

impl Attribute {
    /// Create a numeric attribute.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    /// Create a nominal attribute with the given labels in declaration order.
    pub fn nominal<S: Into<String>>(name: impl Into<String>, labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal(labels.into_iter().map(Into::into).collect()),
        }
    }

    /// Return the attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the declared type.
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Return the declared labels of a nominal attribute.
    pub fn labels(&self) -> Option<&[String]> {
        match &self.kind {
            AttributeKind::Nominal(labels) => Some(labels),
            AttributeKind::Numeric => None,
        }
    }

    /// Return the index of `label` among a nominal attribute's labels.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels()?.iter().position(|l| l == label)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AttributeKind::Numeric => write!(f, "{} numeric", self.name),
            AttributeKind::Nominal(labels) => write!(f, "{} {{{}}}", self.name, labels.join(",")),
        }
    }
}

/// A labeled dataset: ordered instances over a fixed attribute header.
///
/// Each row holds one value per attribute. Nominal values are stored as the
/// zero-based label index, missing values as [`MISSING`]. The class label of
/// a row is `row[class_index]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    relation: String,
    attributes: Vec<Attribute>,
    rows: Vec<Vec<f64>>,
    class_index: Option<usize>,
}

impl Dataset {
    /// Create a dataset. Row widths are the caller's responsibility; the
    /// reader guarantees them for loaded files.
    pub fn new(relation: impl Into<String>, attributes: Vec<Attribute>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == attributes.len()));
        Self {
            relation: relation.into(),
            attributes,
            rows,
            class_index: None,
        }
    }

    /// Return the relation name.
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Return the attribute header.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return all rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of instances.
    pub fn n_instances(&self) -> usize {
        self.rows.len()
    }

    /// Number of attributes, class included.
    pub fn n_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// True when there are no instances.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return the class attribute index, if set.
    pub fn class_index(&self) -> Option<usize> {
        self.class_index
    }

    /// Designate attribute `index` as the class.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidClassIndex`] if `index` is out of range.
    pub fn set_class_index(&mut self, index: usize) -> Result<(), IoError> {
        if index >= self.attributes.len() {
            return Err(IoError::InvalidClassIndex {
                index,
                n_attributes: self.attributes.len(),
            });
        }
        self.class_index = Some(index);
        Ok(())
    }

    /// Use the last attribute as the class unless a class is already set.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidClassIndex`] for a dataset without attributes.
    pub fn set_class_to_last(&mut self) -> Result<(), IoError> {
        if self.class_index.is_some() {
            return Ok(());
        }
        let last = self.attributes.len().checked_sub(1).ok_or(IoError::InvalidClassIndex {
            index: 0,
            n_attributes: 0,
        })?;
        self.set_class_index(last)
    }

    /// Return the class attribute, if set.
    pub fn class_attribute(&self) -> Option<&Attribute> {
        self.class_index.map(|i| &self.attributes[i])
    }

    /// Return the class value of row `row_index`.
    pub fn class_value(&self, row_index: usize) -> Option<f64> {
        let class = self.class_index?;
        self.rows.get(row_index).map(|row| row[class])
    }

    /// Iterate the class value of every row in order.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingClassIndex`] if no class is set.
    pub fn class_values(&self) -> Result<impl Iterator<Item = f64> + '_, IoError> {
        let class = self.require_class()?;
        Ok(self.rows.iter().map(move |row| row[class]))
    }

    /// A dataset with the same header and class index holding `rows`.
    pub fn with_rows(&self, rows: Vec<Vec<f64>>) -> Self {
        Self {
            relation: self.relation.clone(),
            attributes: self.attributes.clone(),
            rows,
            class_index: self.class_index,
        }
    }

    /// An empty dataset with the same header and class index.
    pub fn empty_like(&self) -> Self {
        self.with_rows(Vec::new())
    }

    /// The rows at `indices`, in the order given.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    pub fn subset(&self, indices: &[usize]) -> Self {
        self.with_rows(indices.iter().map(|&i| self.rows[i].clone()).collect())
    }

    /// Append a row.
    pub fn push(&mut self, row: Vec<f64>) {
        debug_assert_eq!(row.len(), self.attributes.len());
        self.rows.push(row);
    }

    /// Numeric/nominal flag for every non-class attribute, in column order.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingClassIndex`] if no class is set.
    pub fn feature_kinds(&self) -> Result<Vec<FeatureKind>, IoError> {
        let class = self.require_class()?;
        Ok(self
            .attributes
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != class)
            .map(|(_, a)| match a.kind {
                AttributeKind::Numeric => FeatureKind::Numeric,
                AttributeKind::Nominal(_) => FeatureKind::Nominal,
            })
            .collect())
    }

    /// Split rows into feature vectors (class column removed) and class labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::MissingClassIndex`] | no class is set |
    /// | [`IoError::InvalidClassValue`] | the class is numeric, or a value is not a label index |
    pub fn features_and_labels(&self) -> Result<(Vec<Vec<f64>>, Vec<usize>), IoError> {
        let class = self.require_class()?;
        let n_labels = self.attributes[class].labels().map_or(0, <[String]>::len);

        let mut features = Vec::with_capacity(self.rows.len());
        let mut labels = Vec::with_capacity(self.rows.len());
        for (row_index, row) in self.rows.iter().enumerate() {
            let value = row[class];
            if value < 0.0 || value.fract() != 0.0 || value >= n_labels as f64 {
                return Err(IoError::InvalidClassValue {
                    row_index,
                    value,
                    n_labels,
                });
            }
            labels.push(value as usize);
            features.push(
                row.iter()
                    .enumerate()
                    .filter(|&(i, _)| i != class)
                    .map(|(_, &v)| v)
                    .collect(),
            );
        }
        Ok((features, labels))
    }

    /// Rebuild a dataset from feature rows and labels produced by
    /// [`Dataset::features_and_labels`], reinserting the class column.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingClassIndex`] if no class is set.
    pub fn with_features_and_labels(
        &self,
        features: Vec<Vec<f64>>,
        labels: &[usize],
    ) -> Result<Self, IoError> {
        let class = self.require_class()?;
        let rows = features
            .into_iter()
            .zip(labels)
            .map(|(mut row, &label)| {
                row.insert(class, label as f64);
                row
            })
            .collect();
        Ok(self.with_rows(rows))
    }

    /// Number of missing cells over all rows, class included.
    pub fn n_missing(&self) -> usize {
        self.rows.iter().flatten().filter(|&&v| is_missing(v)).count()
    }

    /// Drop rows with a missing class and fill every other missing cell.
    ///
    /// A numeric cell gets the mean of its column over the kept rows, a
    /// nominal cell the most frequent label (lowest index on ties). A column
    /// with no present value fills with 0.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingClassIndex`] if no class is set.
    pub fn replace_missing(&self) -> Result<Self, IoError> {
        let class = self.require_class()?;
        let mut rows: Vec<Vec<f64>> = self
            .rows
            .iter()
            .filter(|row| !is_missing(row[class]))
            .cloned()
            .collect();

        for (col, attribute) in self.attributes.iter().enumerate() {
            let present = rows.iter().map(|row| row[col]).filter(|&v| !is_missing(v));
            let fill = match attribute.labels() {
                None => {
                    let (sum, n) = present.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                    if n == 0 { 0.0 } else { sum / n as f64 }
                }
                Some(labels) => {
                    let mut counts = vec![0usize; labels.len()];
                    for v in present {
                        counts[v as usize] += 1;
                    }
                    let mut mode = 0;
                    for (label, &count) in counts.iter().enumerate() {
                        if count > counts[mode] {
                            mode = label;
                        }
                    }
                    mode as f64
                }
            };
            for row in &mut rows {
                if is_missing(row[col]) {
                    row[col] = fill;
                }
            }
        }

        Ok(self.with_rows(rows))
    }

    fn require_class(&self) -> Result<usize, IoError> {
        self.class_index.ok_or_else(|| IoError::MissingClassIndex {
            relation: self.relation.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather() -> Dataset {
        let attributes = vec![
            Attribute::numeric("temp"),
            Attribute::nominal("outlook", ["sunny", "rainy"]),
            Attribute::nominal("play", ["0", "1"]),
        ];
        let rows = vec![
            vec![20.5, 0.0, 1.0],
            vec![11.0, 1.0, 0.0],
            vec![15.0, 1.0, 1.0],
        ];
        Dataset::new("weather", attributes, rows)
    }

    #[test]
    fn replace_missing_fills_mean_and_mode() {
        let attributes = vec![
            Attribute::numeric("temp"),
            Attribute::nominal("outlook", ["sunny", "rainy"]),
            Attribute::nominal("play", ["0", "1"]),
        ];
        let rows = vec![
            vec![10.0, 1.0, 1.0],
            vec![MISSING, 1.0, 0.0],
            vec![20.0, MISSING, 1.0],
            vec![99.0, 0.0, MISSING],
        ];
        let mut ds = Dataset::new("gaps", attributes, rows);
        ds.set_class_to_last().unwrap();
        assert_eq!(ds.n_missing(), 3);

        let filled = ds.replace_missing().unwrap();
        // The unlabeled row is gone and does not feed the fills.
        assert_eq!(filled.n_instances(), 3);
        assert_eq!(filled.n_missing(), 0);
        assert_eq!(filled.rows()[1], vec![15.0, 1.0, 0.0]);
        assert_eq!(filled.rows()[2], vec![20.0, 1.0, 1.0]);
    }

    #[test]
    fn replace_missing_without_gaps_is_identity() {
        let mut ds = weather();
        ds.set_class_to_last().unwrap();
        assert_eq!(ds.replace_missing().unwrap(), ds);
        assert!(matches!(
            weather().replace_missing(),
            Err(IoError::MissingClassIndex { .. })
        ));
    }

    #[test]
    fn class_defaults_to_last_attribute() {
        let mut ds = weather();
        assert_eq!(ds.class_index(), None);
        ds.set_class_to_last().unwrap();
        assert_eq!(ds.class_index(), Some(2));
        assert_eq!(ds.class_attribute().unwrap().name(), "play");
        assert_eq!(ds.class_value(1), Some(0.0));
    }

    #[test]
    fn set_class_to_last_keeps_existing_choice() {
        let mut ds = weather();
        ds.set_class_index(1).unwrap();
        ds.set_class_to_last().unwrap();
        assert_eq!(ds.class_index(), Some(1));
    }

    #[test]
    fn out_of_range_class_index() {
        let mut ds = weather();
        assert!(matches!(
            ds.set_class_index(3),
            Err(IoError::InvalidClassIndex {
                index: 3,
                n_attributes: 3
            })
        ));
    }

    #[test]
    fn features_and_labels_drop_the_class_column() {
        let mut ds = weather();
        ds.set_class_to_last().unwrap();
        let (features, labels) = ds.features_and_labels().unwrap();
        assert_eq!(features[0], vec![20.5, 0.0]);
        assert_eq!(labels, vec![1, 0, 1]);
        assert_eq!(
            ds.feature_kinds().unwrap(),
            vec![FeatureKind::Numeric, FeatureKind::Nominal]
        );
    }

    #[test]
    fn features_and_labels_round_trip_through_class_column() {
        let mut ds = weather();
        ds.set_class_index(1).unwrap();
        let (features, labels) = ds.features_and_labels().unwrap();
        let rebuilt = ds.with_features_and_labels(features, &labels).unwrap();
        assert_eq!(rebuilt, ds);
    }

    #[test]
    fn numeric_class_is_not_a_label() {
        let mut ds = weather();
        ds.set_class_index(0).unwrap();
        assert!(matches!(
            ds.features_and_labels(),
            Err(IoError::InvalidClassValue { row_index: 0, n_labels: 0, .. })
        ));
    }

    #[test]
    fn missing_class_index_is_reported() {
        let ds = weather();
        assert!(matches!(
            ds.features_and_labels(),
            Err(IoError::MissingClassIndex { .. })
        ));
    }

    #[test]
    fn subset_keeps_requested_order() {
        let ds = weather();
        let sub = ds.subset(&[2, 0]);
        assert_eq!(sub.rows(), &[vec![15.0, 1.0, 1.0], vec![20.5, 0.0, 1.0]]);
        assert!(ds.empty_like().is_empty());
    }

    #[test]
    fn attribute_display() {
        assert_eq!(Attribute::nominal("c", ["0", "1"]).to_string(), "c {0,1}");
        assert_eq!(Attribute::numeric("x").to_string(), "x numeric");
    }
}
