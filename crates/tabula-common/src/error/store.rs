//! Errors reported by the table store.

use thiserror::Error;

use crate::types::ColumnType;

/// Store error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No master could be reached.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// A request exceeded the socket read timeout.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The table does not exist.
    #[error("table does not exist: {0}")]
    TableMissing(String),

    /// The table already exists.
    #[error("table already exists: {0}")]
    TableExists(String),

    /// The column does not exist.
    #[error("column not found: {0}")]
    ColumnMissing(String),

    /// The column already exists.
    #[error("column already exists: {0}")]
    ColumnExists(String),

    /// A getter was called for the wrong type.
    #[error("column '{column}' is {actual}, requested as {requested}")]
    TypeMismatch {
        /// Column name.
        column: String,
        /// Type the caller asked for.
        requested: ColumnType,
        /// Declared type of the column.
        actual: ColumnType,
    },

    /// A typed getter was called on a null cell.
    #[error("column '{0}' is null")]
    NullCell(String),

    /// The row does not match the table schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The scanner has already been closed.
    #[error("scanner is closed")]
    ScannerClosed,

    /// Any other RPC failure.
    #[error("rpc failed: {0}")]
    Rpc(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
