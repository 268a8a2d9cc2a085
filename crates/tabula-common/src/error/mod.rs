//! Error handling for Tabula.
//!
//! `StoreError` is what the table store reports. `TabulaError` is what the
//! helper surfaces to its callers; it keeps the store error attached as its
//! source wherever one exists.

mod store;

use thiserror::Error;

use crate::types::ColumnType;

pub use store::{StoreError, StoreResult};

/// Helper error type.
#[derive(Debug, Error)]
pub enum TabulaError {
    /// The store is unreachable or timed out.
    #[error("connection failed: {0}")]
    Connection(#[source] StoreError),

    /// The named table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// A table-less operation was called on a helper with no bound table.
    #[error("no table bound to this helper")]
    NoTableBound,

    /// The store failed while building a scanner, fetching a page, or reading a cell.
    #[error("scan of table '{table}' failed: {source}")]
    Scan {
        /// Table being scanned.
        table: String,
        /// Store-reported cause.
        #[source]
        source: StoreError,
    },

    /// A typed getter failed on one cell.
    #[error("reading column '{column}' failed: {source}")]
    ColumnRead {
        /// Column being read.
        column: String,
        /// Store-reported cause.
        #[source]
        source: StoreError,
    },

    /// The schema declares a column type with no row accessor.
    #[error("unsupported column type {column_type} for column '{column}'")]
    UnsupportedColumnType {
        /// Offending column.
        column: String,
        /// Its declared type.
        column_type: ColumnType,
    },

    /// A schema-change request failed.
    #[error("alter of table '{table}' failed: {source}")]
    Alter {
        /// Table being altered.
        table: String,
        /// Store-reported cause.
        #[source]
        source: StoreError,
    },

    /// A column type name did not parse.
    #[error("invalid column type: {0}")]
    InvalidColumnType(String),

    /// Configuration was rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TabulaError {
    /// Classifies a failed table lookup.
    ///
    /// A missing table becomes `TableNotFound`; anything else the store
    /// reports while resolving a name is a connection problem.
    pub fn lookup_failed(table: &str, source: StoreError) -> Self {
        match source {
            StoreError::TableMissing(_) => TabulaError::TableNotFound(table.to_string()),
            other => TabulaError::Connection(other),
        }
    }

    /// Wraps a store failure raised during a scan.
    pub fn scan(table: impl Into<String>, source: StoreError) -> Self {
        TabulaError::Scan {
            table: table.into(),
            source,
        }
    }

    /// Wraps a store failure raised by a cell getter.
    pub fn column_read(column: impl Into<String>, source: StoreError) -> Self {
        TabulaError::ColumnRead {
            column: column.into(),
            source,
        }
    }

    /// Wraps a store failure raised by an alter request.
    pub fn alter(table: impl Into<String>, source: StoreError) -> Self {
        TabulaError::Alter {
            table: table.into(),
            source,
        }
    }

    /// Returns the store error attached to this error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            TabulaError::Connection(source)
            | TabulaError::Scan { source, .. }
            | TabulaError::ColumnRead { source, .. }
            | TabulaError::Alter { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for helper operations.
pub type TabulaResult<T> = Result<T, TabulaError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_lookup_classification() {
        let missing = TabulaError::lookup_failed("t", StoreError::TableMissing("t".into()));
        assert!(matches!(missing, TabulaError::TableNotFound(name) if name == "t"));

        let down = TabulaError::lookup_failed("t", StoreError::Unreachable("m1:7051".into()));
        assert!(matches!(down, TabulaError::Connection(StoreError::Unreachable(_))));

        let slow = TabulaError::lookup_failed("t", StoreError::Timeout(6000));
        assert!(matches!(slow, TabulaError::Connection(StoreError::Timeout(6000))));
    }

    #[test]
    fn test_source_is_attached() {
        let err = TabulaError::scan("t", StoreError::Rpc("tablet server gone".into()));
        assert_eq!(
            err.to_string(),
            "scan of table 't' failed: rpc failed: tablet server gone"
        );
        let source = err.source().expect("scan error carries its cause");
        assert_eq!(source.to_string(), "rpc failed: tablet server gone");
        assert!(matches!(err.store_error(), Some(StoreError::Rpc(_))));
    }

    #[test]
    fn test_unsupported_message_names_type() {
        let err = TabulaError::UnsupportedColumnType {
            column: "price".into(),
            column_type: ColumnType::Decimal,
        };
        assert_eq!(
            err.to_string(),
            "unsupported column type DECIMAL for column 'price'"
        );
        assert!(err.store_error().is_none());
    }
}
