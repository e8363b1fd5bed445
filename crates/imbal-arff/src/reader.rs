//! Attribute-relation file reader with full input validation.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::domain::{Attribute, AttributeKind, Dataset, MISSING};
use crate::IoError;

/// Reads a labeled dataset from an attribute-relation (`.arff`) file.
///
/// Expected format:
/// - `%` comment lines and blank lines anywhere
/// - `@relation <name>`
/// - one `@attribute <name> <type>` per column, type `numeric`/`real`/`integer`
///   or a nominal label list `{a,b,c}`
/// - `@data`, followed by one comma-separated row per instance
///
/// The class attribute is left unset; callers choose it on the returned
/// [`Dataset`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or cannot be opened |
/// | [`IoError::Read`] | File cannot be read as UTF-8 text |
/// | [`IoError::MalformedHeader`] | Unknown keyword or unparseable declaration |
/// | [`IoError::UnsupportedAttributeType`] | `string`, `date` or `relational` attribute |
/// | [`IoError::DuplicateAttribute`] | Two attributes share a name |
/// | [`IoError::NoAttributes`] | Header declares no attributes |
/// | [`IoError::MissingDataSection`] | No `@data` line |
/// | [`IoError::CsvParse`] | Malformed data record |
/// | [`IoError::SparseRowUnsupported`] | Row in `{index value}` form |
/// | [`IoError::InconsistentRowLength`] | Row width differs from attribute count |
/// | [`IoError::NonFiniteValue`] | Numeric cell is NaN, Inf, or unparseable |
/// | [`IoError::UnknownNominalValue`] | Nominal cell is not a declared label |
pub struct ArffReader {
    path: PathBuf,
}

struct Header {
    relation: String,
    attributes: Vec<Attribute>,
    data_offset: usize,
}

impl ArffReader {
    /// Create a new reader for the given file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let mut file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;
        let mut text = String::new();
        file.read_to_string(&mut text).map_err(|e| IoError::Read {
            path: self.path.clone(),
            source: e,
        })?;

        let header = self.parse_header(&text)?;
        debug!(
            relation = %header.relation,
            n_attributes = header.attributes.len(),
            "read header"
        );

        let rows = self.parse_data(&text[header.data_offset..], &header.attributes)?;

        info!(
            relation = %header.relation,
            n_instances = rows.len(),
            n_attributes = header.attributes.len(),
            "dataset loaded"
        );

        Ok(Dataset::new(header.relation, header.attributes, rows))
    }

    fn parse_header(&self, text: &str) -> Result<Header, IoError> {
        let mut relation = None;
        let mut attributes = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0;

        for (line_index, raw_line) in text.split_inclusive('\n').enumerate() {
            offset += raw_line.len();
            let line_no = line_index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }

            let (keyword, rest) = split_keyword(line);
            match keyword.to_ascii_lowercase().as_str() {
                "@relation" => {
                    let (name, _) = next_token(rest).ok_or_else(|| {
                        self.malformed(line_no, "@relation without a name")
                    })?;
                    relation = Some(name);
                }
                "@attribute" => {
                    let attribute = self.parse_attribute(line_no, rest)?;
                    if !seen.insert(attribute.name().to_string()) {
                        return Err(IoError::DuplicateAttribute {
                            path: self.path.clone(),
                            line: line_no,
                            name: attribute.name().to_string(),
                        });
                    }
                    attributes.push(attribute);
                }
                "@data" => {
                    if attributes.is_empty() {
                        return Err(IoError::NoAttributes {
                            path: self.path.clone(),
                        });
                    }
                    let relation = relation
                        .ok_or_else(|| self.malformed(line_no, "@data before @relation"))?;
                    return Ok(Header {
                        relation,
                        attributes,
                        data_offset: offset,
                    });
                }
                _ => {
                    return Err(self.malformed(line_no, format!("unexpected line \"{line}\"")));
                }
            }
        }

        if attributes.is_empty() {
            return Err(IoError::NoAttributes {
                path: self.path.clone(),
            });
        }
        Err(IoError::MissingDataSection {
            path: self.path.clone(),
        })
    }

    fn parse_attribute(&self, line_no: usize, rest: &str) -> Result<Attribute, IoError> {
        let (name, kind) =
            next_token(rest).ok_or_else(|| self.malformed(line_no, "@attribute without a name"))?;
        let kind = kind.trim();

        if let Some(body) = kind.strip_prefix('{') {
            let body = body
                .strip_suffix('}')
                .ok_or_else(|| self.malformed(line_no, "unterminated nominal label list"))?;
            let labels = split_labels(body);
            if labels.is_empty() {
                return Err(self.malformed(line_no, format!("nominal attribute {name} has no labels")));
            }
            return Ok(Attribute::nominal(name, labels));
        }

        let type_word = kind.split_whitespace().next().unwrap_or("");
        match type_word.to_ascii_lowercase().as_str() {
            "numeric" | "real" | "integer" => Ok(Attribute::numeric(name)),
            "string" | "date" | "relational" => Err(IoError::UnsupportedAttributeType {
                path: self.path.clone(),
                line: line_no,
                name,
                kind: type_word.to_string(),
            }),
            "" => Err(self.malformed(line_no, format!("attribute {name} has no type"))),
            other => Err(self.malformed(line_no, format!("unknown attribute type \"{other}\""))),
        }
    }

    fn parse_data(&self, data: &str, attributes: &[Attribute]) -> Result<Vec<Vec<f64>>, IoError> {
        // flexible(true) so that row width mismatches surface as
        // InconsistentRowLength rather than a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'%'))
            .quote(b'\'')
            .from_reader(data.as_bytes());

        let expected = attributes.len();
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;
            // Whitespace-only lines come through as a single empty field.
            if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
                continue;
            }
            let row_index = rows.len();

            if record.get(0).is_some_and(|first| first.starts_with('{')) {
                return Err(IoError::SparseRowUnsupported {
                    path: self.path.clone(),
                    row_index,
                });
            }
            if record.len() != expected {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected,
                    got: record.len(),
                });
            }

            let mut row = Vec::with_capacity(expected);
            for (col_index, (raw, attribute)) in record.iter().zip(attributes).enumerate() {
                row.push(self.parse_cell(raw, attribute, row_index, col_index)?);
            }
            rows.push(row);
        }

        Ok(rows)
    }

    fn parse_cell(
        &self,
        raw: &str,
        attribute: &Attribute,
        row_index: usize,
        col_index: usize,
    ) -> Result<f64, IoError> {
        if raw == "?" {
            return Ok(MISSING);
        }
        match attribute.kind() {
            AttributeKind::Numeric => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(IoError::NonFiniteValue {
                    path: self.path.clone(),
                    row_index,
                    col_index,
                    raw: raw.to_string(),
                }),
            },
            AttributeKind::Nominal(_) => attribute
                .label_index(unquote(raw))
                .map(|i| i as f64)
                .ok_or_else(|| IoError::UnknownNominalValue {
                    path: self.path.clone(),
                    row_index,
                    attribute: attribute.name().to_string(),
                    raw: raw.to_string(),
                }),
        }
    }

    fn malformed(&self, line: usize, reason: impl Into<String>) -> IoError {
        IoError::MalformedHeader {
            path: self.path.clone(),
            line,
            reason: reason.into(),
        }
    }
}

fn split_keyword(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], &line[i..]),
        None => (line, ""),
    }
}

/// Take one possibly quoted token off the front of `s`.
fn next_token(s: &str) -> Option<(String, &str)> {
    let s = s.trim_start();
    let mut chars = s.char_indices();
    let (_, first) = chars.next()?;
    if first == '\'' || first == '"' {
        let end = s[1..].find(first)? + 1;
        return Some((s[1..end].to_string(), &s[end + 1..]));
    }
    let end = s
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(s.len());
    Some((s[..end].to_string(), &s[end..]))
}

fn split_labels(body: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    for c in body.chars() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, ',') => labels.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    labels.push(current);
    labels
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_missing;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_arff(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    const SMALL: &str = "% toy relation\n\
@relation 'toy data'\n\
\n\
@attribute x numeric\n\
@ATTRIBUTE \"colour name\" {red, 'dark blue'}\n\
@attribute class {0,1}\n\
\n\
@data\n\
1.5,red,0\n\
% inline comment\n\
-2,'dark blue',1\n\
\n\
3e2, red ,1\n";

    #[test]
    fn read_valid_file() {
        let f = write_arff(SMALL);
        let ds = ArffReader::new(f.path()).read().unwrap();
        assert_eq!(ds.relation(), "toy data");
        assert_eq!(ds.n_attributes(), 3);
        assert_eq!(ds.attributes()[1].name(), "colour name");
        assert_eq!(
            ds.attributes()[1].labels().unwrap(),
            &["red".to_string(), "dark blue".to_string()]
        );
        assert_eq!(ds.n_instances(), 3);
        assert_eq!(ds.rows()[0], vec![1.5, 0.0, 0.0]);
        assert_eq!(ds.rows()[1], vec![-2.0, 1.0, 1.0]);
        assert_eq!(ds.rows()[2], vec![300.0, 0.0, 1.0]);
        assert_eq!(ds.class_index(), None);
    }

    #[test]
    fn type_keywords_are_case_insensitive() {
        let f = write_arff("@RELATION r\n@Attribute a REAL\n@attribute b Integer\n@attribute c {0,1}\n@DATA\n1,2,0\n");
        let ds = ArffReader::new(f.path()).read().unwrap();
        assert_eq!(ds.attributes()[0].kind(), &AttributeKind::Numeric);
        assert_eq!(ds.attributes()[1].kind(), &AttributeKind::Numeric);
    }

    #[test]
    fn empty_data_section_is_accepted() {
        let f = write_arff("@relation r\n@attribute a numeric\n@attribute c {0,1}\n@data\n");
        let ds = ArffReader::new(f.path()).read().unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.n_attributes(), 2);
    }

    #[test]
    fn error_file_not_found() {
        let result = ArffReader::new(Path::new("/no/such/file.arff")).read();
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_missing_data_section() {
        let f = write_arff("@relation r\n@attribute a numeric\n");
        let result = ArffReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::MissingDataSection { .. })));
    }

    #[test]
    fn error_no_attributes() {
        let f = write_arff("@relation r\n@data\n1\n");
        let result = ArffReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::NoAttributes { .. })));
    }

    #[test]
    fn error_unsupported_string_attribute() {
        let f = write_arff("@relation r\n@attribute s string\n@data\nabc\n");
        let result = ArffReader::new(f.path()).read();
        match result {
            Err(IoError::UnsupportedAttributeType { line, name, kind, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(name, "s");
                assert_eq!(kind, "string");
            }
            other => panic!("expected UnsupportedAttributeType, got {other:?}"),
        }
    }

    #[test]
    fn error_unknown_keyword() {
        let f = write_arff("@relation r\n@attribute a numeric\n@bogus\n@data\n");
        let result = ArffReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::MalformedHeader { line: 3, .. })));
    }

    #[test]
    fn error_duplicate_attribute() {
        let f = write_arff("@relation r\n@attribute a numeric\n@attribute a numeric\n@data\n");
        let result = ArffReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::DuplicateAttribute { line: 3, .. })));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let f = write_arff("@relation r\n@attribute a numeric\n@attribute c {0,1}\n@data\n1,0\n2\n");
        let result = ArffReader::new(f.path()).read();
        match result {
            Err(IoError::InconsistentRowLength { row_index, expected, got, .. }) => {
                assert_eq!(row_index, 1);
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("expected InconsistentRowLength, got {other:?}"),
        }
    }

    #[test]
    fn question_mark_reads_as_missing() {
        let f = write_arff(
            "@relation r\n@attribute a numeric\n@attribute c {0,1}\n@data\n?,0\n1.5,?\n",
        );
        let ds = ArffReader::new(f.path()).read().unwrap();
        assert_eq!(ds.n_missing(), 2);
        assert!(is_missing(ds.rows()[0][0]));
        assert_eq!(ds.rows()[1][0], 1.5);
        assert!(is_missing(ds.rows()[1][1]));
    }

    #[test]
    fn error_non_finite_value() {
        let f = write_arff("@relation r\n@attribute a numeric\n@attribute c {0,1}\n@data\nNaN,0\n");
        let result = ArffReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::NonFiniteValue { .. })));
    }

    #[test]
    fn error_unknown_nominal_value() {
        let f = write_arff("@relation r\n@attribute a numeric\n@attribute c {0,1}\n@data\n1,2\n");
        let result = ArffReader::new(f.path()).read();
        match result {
            Err(IoError::UnknownNominalValue { attribute, raw, .. }) => {
                assert_eq!(attribute, "c");
                assert_eq!(raw, "2");
            }
            other => panic!("expected UnknownNominalValue, got {other:?}"),
        }
    }

    #[test]
    fn error_sparse_row() {
        let f = write_arff("@relation r\n@attribute a numeric\n@attribute c {0,1}\n@data\n{0 1, 1 0}\n");
        let result = ArffReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::SparseRowUnsupported { row_index: 0, .. })));
    }

    #[test]
    fn labels_split_respects_quotes() {
        assert_eq!(split_labels(" a, 'b,c' ,\"d\""), vec!["a", "b,c", "d"]);
        assert!(split_labels("  ").is_empty());
    }
}
