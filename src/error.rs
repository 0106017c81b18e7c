//! Error types for tablescope.

use std::fmt;

/// All errors produced by tablescope operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// CSV parsing failed.
    CsvParse { line: usize, message: String },
    /// File extension is not one of the supported table formats.
    UnsupportedExtension { extension: String },
    /// Parquet decoding failed.
    Parquet(String),
    /// The table has no columns to profile.
    EmptyTable,
    /// Column not found in DataFrame.
    ColumnNotFound { name: String },
    /// Dimension mismatch.
    DimensionMismatch { expected: usize, actual: usize },
    /// I/O error during file reading.
    Io(String),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CsvParse { line, message } => {
                write!(f, "CSV parse error at line {line}: {message}")
            }
            Self::UnsupportedExtension { extension } => {
                write!(f, "cannot process file extension: {extension}")
            }
            Self::Parquet(msg) => write!(f, "Parquet error: {msg}"),
            Self::EmptyTable => write!(f, "table has no columns"),
            Self::ColumnNotFound { name } => {
                write!(f, "column '{name}' not found")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} elements, got {actual}")
            }
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<std::io::Error> for ProfileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
