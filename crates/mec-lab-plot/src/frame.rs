//! A small column-addressable view of an extraction CSV. Columns are
//! resolved by header name, so a reordered or missing column is an error
//! rather than silently misread data.

use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

#[derive(Debug, Clone)]
pub struct Frame {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("Malformed record in {}", path.display()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|header| header == name)
            .with_context(|| format!("column `{name}` missing (header: {:?})", self.headers))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn parse_f64(field: &str) -> Result<f64> {
    field
        .trim()
        .parse()
        .with_context(|| format!("`{field}` is not a number"))
}

/// Label a continuous value with the first range it falls into:
/// `value <= bound` picks that label, anything larger gets `last`.
pub fn range_label<'a>(value: f64, bounds: &[(f64, &'a str)], last: &'a str) -> &'a str {
    for (bound, label) in bounds {
        if value <= *bound {
            return label;
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn columns_resolved_by_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "algorithm,interval,utility\nGreedy,10,45.5\n").unwrap();
        let frame = Frame::from_csv(file.path()).unwrap();
        let utility = frame.column("utility").unwrap();
        assert_eq!(utility, 2);
        let row = frame.rows().next().unwrap();
        assert_eq!(parse_f64(&row[utility]).unwrap(), 45.5);
        assert!(frame.column("energy").is_err());
    }

    #[test]
    fn range_labels_follow_chained_bounds() {
        let bounds = [(65.0, "20-65"), (110.0, "65-110"), (155.0, "110-155")];
        assert_eq!(range_label(28.0, &bounds, "155-200"), "20-65");
        assert_eq!(range_label(65.0, &bounds, "155-200"), "20-65");
        assert_eq!(range_label(66.0, &bounds, "155-200"), "65-110");
        assert_eq!(range_label(180.0, &bounds, "155-200"), "155-200");
    }
}
