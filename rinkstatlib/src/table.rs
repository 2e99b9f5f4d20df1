//! The tabular data model handed from producers to the renderer.
//!
//! A [`TabularResult`] is a header list plus fully materialized rows of
//! display strings. Producers (the SQLite query service, the CSV and JSON
//! sources) do all type-specific formatting before building one; the
//! renderer never looks at anything but string lengths.

use serde::{Deserialize, Serialize};

use crate::error::RinkstatError;
use crate::Result;

/// One row of pre-formatted cells.
pub type Row = Vec<String>;

/// Headers and materialized rows of a query or file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularResult {
    /// Column names, one per column
    pub headers: Vec<String>,
    /// Data rows, each expected to hold one cell per header
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl TabularResult {
    /// Create an empty result with the given headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Materialize a row stream into a result.
    ///
    /// Consumes the whole stream even when only a prefix will be displayed,
    /// since the row count is not known up front.
    pub fn collect<H, S, I>(headers: H, rows: I) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
        I: IntoIterator<Item = Row>,
    {
        let mut result = Self::new(headers);
        result.rows.extend(rows);
        result
    }

    /// Builder: append a row.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells);
        self
    }

    /// Append a row. Arity is checked when the row is rendered.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Number of columns (header count).
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Number of materialized rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check every row against the header count.
    pub fn validate(&self) -> Result<()> {
        self.rows
            .iter()
            .enumerate()
            .try_for_each(|(index, row)| check_arity(index, row, self.headers.len()))
    }

    /// Copy of this result holding at most `cap` rows.
    pub fn truncated(&self, cap: Option<usize>) -> Self {
        let keep = cap.map_or(self.rows.len(), |cap| cap.min(self.rows.len()));
        Self {
            headers: self.headers.clone(),
            rows: self.rows[..keep].to_vec(),
        }
    }
}

/// Convert a nullable value to its display string (`None` becomes "").
pub fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub(crate) fn check_arity(index: usize, row: &[String], expected: usize) -> Result<()> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(RinkstatError::MalformedRow {
            row: index,
            expected,
            found: row.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_null_is_empty() {
        assert_eq!(cell::<i64>(None), "");
        assert_eq!(cell(Some(42)), "42");
        assert_eq!(cell(Some("Jets")), "Jets");
    }

    #[test]
    fn test_collect_materializes_every_row() {
        let rows = (1..=5).map(|i| vec![i.to_string()]);
        let result = TabularResult::collect(["N"], rows);
        assert_eq!(result.column_count(), 1);
        assert_eq!(result.row_count(), 5);
        assert_eq!(result.rows[4], vec!["5".to_string()]);
    }

    #[test]
    fn test_validate_reports_first_bad_row() {
        let result = TabularResult::new(["First", "Last"])
            .with_row(["Connor", "McDavid"])
            .with_row(["Sidney"])
            .with_row(["a", "b", "c"]);

        match result.validate() {
            Err(RinkstatError::MalformedRow {
                row,
                expected,
                found,
            }) => {
                assert_eq!(row, 1);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated() {
        let result = TabularResult::new(["N"])
            .with_row(["1"])
            .with_row(["2"])
            .with_row(["3"]);
        assert_eq!(result.truncated(Some(2)).row_count(), 2);
        assert_eq!(result.truncated(Some(10)).row_count(), 3);
        assert_eq!(result.truncated(None).row_count(), 3);
    }

    #[test]
    fn test_json_shape() {
        let result = TabularResult::new(["ID", "City"]).with_row(["1", "Winnipeg"]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["headers"][1], "City");
        assert_eq!(json["rows"][0][1], "Winnipeg");
    }
}
