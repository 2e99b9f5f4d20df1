//! Loading tabular results from files.
//!
//! Two formats are understood:
//!
//! - **CSV**: the first record is the header row. Records with a different
//!   field count are accepted here and rejected by the renderer, so the error
//!   names the offending row.
//! - **JSON**: `{"headers": [...], "rows": [[...], ...]}`. Cells may be
//!   strings, numbers, booleans or null (null becomes "").

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RinkstatError;
use crate::table::{Row, TabularResult};
use crate::Result;

/// Input file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse().map_err(|_| {
            RinkstatError::UnsupportedFormat(format!(
                "cannot infer format of '{}' (expected .csv or .json)",
                path.display()
            ))
        })
    }
}

impl FromStr for SourceFormat {
    type Err = RinkstatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            other => Err(RinkstatError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Load a file, taking the format from `format` or else from the extension.
pub fn load(path: impl AsRef<Path>, format: Option<SourceFormat>) -> Result<TabularResult> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RinkstatError::PathNotFound(path.to_path_buf()));
    }
    let format = match format {
        Some(format) => format,
        None => SourceFormat::from_path(path)?,
    };
    let file = File::open(path).map_err(|source| RinkstatError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let result = match format {
        SourceFormat::Csv => read_csv(file)?,
        SourceFormat::Json => read_json(file)?,
    };
    debug!(
        path = %path.display(),
        ?format,
        columns = result.column_count(),
        rows = result.row_count(),
        "loaded tabular file"
    );
    Ok(result)
}

/// Read CSV with a header record.
pub fn read_csv<R: std::io::Read>(reader: R) -> Result<TabularResult> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Row>()))
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    Ok(TabularResult { headers, rows })
}

#[derive(Deserialize)]
struct JsonTable {
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

/// Read the JSON table shape.
pub fn read_json<R: std::io::Read>(reader: R) -> Result<TabularResult> {
    let table: JsonTable = serde_json::from_reader(reader)?;
    let rows = table
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(json_cell).collect())
        .collect();
    Ok(TabularResult {
        headers: table.headers,
        rows,
    })
}

fn json_cell(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
