//! # tabula-common
//!
//! Common types, errors, and configuration for Tabula.
//!
//! This crate provides the vocabulary shared by the client library and the
//! command-line interface:
//!
//! - **Types**: column types, column descriptors, schemas, dynamic values and records
//! - **Errors**: the `TabulaError` taxonomy and the store-reported `StoreError`
//! - **Config**: client configuration (store addresses, timeouts, scan batching)
//!
//! ## Example
//!
//! ```rust
//! use tabula_common::types::{ColumnDescriptor, ColumnType, Record, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     ColumnDescriptor::new("id", ColumnType::Int32, false),
//!     ColumnDescriptor::new("name", ColumnType::String, true),
//! ]);
//! assert_eq!(schema.names(), vec!["id", "name"]);
//!
//! let mut record = Record::with_capacity(schema.len());
//! record.insert("id", Value::Int32(1));
//! record.insert("name", Value::from("a"));
//! assert_eq!(record.get("id"), Some(&Value::Int32(1)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{StoreError, StoreResult, TabulaError, TabulaResult};
pub use types::{ColumnDescriptor, ColumnType, Record, Schema, Value};
