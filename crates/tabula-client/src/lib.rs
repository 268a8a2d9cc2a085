//! # tabula-client
//!
//! Schema-driven access to a distributed columnar table store.
//!
//! This crate turns a table's typed schema plus a paginated stream of raw
//! row batches into generic [`Record`]s. It includes:
//!
//! - **Store traits**: the collaborator contract a store client implements
//! - **Schema resolution**: column descriptors from a handle or a table name
//! - **Type dispatch**: a closed accessor table from column type to value
//! - **Row projection**: paged scans with a row cap and guaranteed cursor release
//! - **Table helper**: the entry surface, plus add/drop column pass-throughs
//! - **Memory store**: an in-process store for tests, benches and the CLI
//!
//! ## Quick Start
//!
//! ```rust
//! use tabula_client::{MemoryStore, TableHelper};
//! use tabula_common::{ClientConfig, ColumnDescriptor, ColumnType, Schema, Value};
//!
//! let store = MemoryStore::new();
//! store
//!     .create_table(
//!         "users",
//!         Schema::new(vec![
//!             ColumnDescriptor::not_null("id", ColumnType::Int32),
//!             ColumnDescriptor::nullable("name", ColumnType::String),
//!         ]),
//!     )
//!     .unwrap();
//! store
//!     .insert_values("users", vec![Value::Int32(1), Value::from("alice")])
//!     .unwrap();
//!
//! let helper = TableHelper::with_table(store, ClientConfig::default(), "users").unwrap();
//! let records = helper.scan(-1).unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].get("name"), Some(&Value::from("alice")));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Store collaborator traits.
pub mod store;

/// Schema resolution.
pub mod resolver;

/// Column type dispatch.
pub mod dispatch;

/// Row projection.
pub mod projector;

/// Entry surface.
pub mod helper;

/// In-memory store.
pub mod memory;

// Re-exports
pub use dispatch::{extract, Accessor, AccessPlan};
pub use helper::{HelperStats, TableHelper};
pub use memory::{Cell, FaultPlan, MemoryStore, MemoryTable, ProbeSnapshot};
pub use projector::{Projection, RowProjector, ScanLimit, ScanSummary};
pub use resolver::{SchemaResolver, TableRef};
pub use store::{
    AlterStep, AlterTableOptions, RawRow, RowPage, ScanCursor, ScanOptions, TableHandle,
    TableStore,
};
pub use tabula_common::{Record, Schema, TabulaError, TabulaResult, Value};
