//! Error types for rinkstatlib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, querying or rendering tables
#[derive(Error, Debug)]
pub enum RinkstatError {
    /// A row does not have one cell per header
    #[error("malformed row {row}: expected {expected} cells, found {found}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Row cap must be a positive integer
    #[error("invalid row cap {0}: must be at least 1")]
    InvalidRowCap(usize),

    /// No catalog query with this name
    #[error("unknown query '{0}'")]
    UnknownQuery(String),

    /// A required query parameter was not supplied
    #[error("query '{query}' requires parameter '{param}'")]
    MissingParam {
        query: &'static str,
        param: &'static str,
    },

    /// A query parameter could not be parsed
    #[error("invalid value '{value}' for parameter '{param}': {message}")]
    InvalidParam {
        param: String,
        value: String,
        message: String,
    },

    /// Path does not exist
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input file format could not be determined or is not supported
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// Invalid configuration file
    #[error("invalid configuration in '{path}': {message}")]
    Config { path: PathBuf, message: String },

    /// SQLite error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_row_message_names_row() {
        let err = RinkstatError::MalformedRow {
            row: 4,
            expected: 3,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "malformed row 4: expected 3 cells, found 2"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: RinkstatError = io.into();
        assert!(matches!(err, RinkstatError::Io(_)));
    }
}
