//! Error types for the nsearch-rs library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nsearch operations.
pub type Result<T> = std::result::Result<T, NsearchError>;

/// Errors that can occur while staging inputs, running the engine or
/// translating its report.
#[derive(Error, Debug)]
pub enum NsearchError {
    /// A query or database path does not exist
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    /// Input is neither a readable sequence file nor a usable sequence collection
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The engine report does not follow the 13-line block layout
    #[error("Malformed report at line {line}: {reason}")]
    MalformedReport { line: usize, reason: String },

    /// A numeric column of a persisted table holds non-numeric text
    #[error("Column {column}, row {row}: cannot convert {value:?}")]
    TypeCoercion {
        column: &'static str,
        row: usize,
        value: String,
    },

    /// A persisted table has a bad header or ragged rows
    #[error("Malformed table: {0}")]
    MalformedTable(String),

    /// Aligned query and target strings differ in length (or are empty)
    #[error("Aligned sequences differ in length: query {query}, target {target}")]
    LengthMismatch { query: usize, target: usize },

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The native engine exited unsuccessfully
    #[error("nsearch execution failed: {0}")]
    EngineFailed(String),

    /// The native engine executable could not be located
    #[error("{0} binary not found. Install nsearch or set NSEARCH_BIN")]
    BinaryNotFound(String),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<tempfile::PersistError> for NsearchError {
    fn from(e: tempfile::PersistError) -> Self {
        NsearchError::IoError(e.error)
    }
}

impl From<tempfile::PathPersistError> for NsearchError {
    fn from(e: tempfile::PathPersistError) -> Self {
        NsearchError::IoError(e.error)
    }
}
