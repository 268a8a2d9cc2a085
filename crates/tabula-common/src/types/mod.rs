//! Core types for Tabula.
//!
//! This module defines the schema vocabulary of the table store and the
//! dynamically-typed values rows are projected into.

mod column;
mod record;
mod schema;
mod value;

pub use column::{ColumnDescriptor, ColumnType};
pub use record::Record;
pub use schema::Schema;
pub use value::Value;
