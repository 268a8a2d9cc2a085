//! Column type dispatch.
//!
//! Maps each declared column type to the row getter that reads it. The table
//! is closed: a type with no entry is rejected instead of being read through
//! some other getter.
//!
//! | declared type     | getter       | value    |
//! |-------------------|--------------|----------|
//! | `INT8`            | `get_i8`     | `Int8`   |
//! | `INT16`           | `get_i16`    | `Int16`  |
//! | `INT32`           | `get_i32`    | `Int32`  |
//! | `INT64`           | `get_i64`    | `Int64`  |
//! | `UNIXTIME_MICROS` | `get_i64`    | `Int64`  |
//! | `BINARY`          | `get_binary` | `Binary` |
//! | `STRING`          | `get_string` | `String` |
//! | `BOOL`            | `get_bool`   | `Bool`   |
//! | `FLOAT`           | `get_f32`    | `Float`  |
//! | `DOUBLE`          | `get_f64`    | `Double` |
//!
//! Timestamps come out as plain `Int64`. Consumers that need to tell them
//! apart from `INT64` columns must consult the schema.

use bytes::Bytes;

use tabula_common::{
    ColumnDescriptor, ColumnType, Record, Schema, StoreResult, TabulaError, TabulaResult, Value,
};

use crate::store::RawRow;

/// Row getter selected for a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// `get_i8`.
    Int8,
    /// `get_i16`.
    Int16,
    /// `get_i32`.
    Int32,
    /// `get_i64`, shared by `INT64` and `UNIXTIME_MICROS`.
    Int64,
    /// `get_binary`.
    Binary,
    /// `get_string`.
    String,
    /// `get_bool`.
    Bool,
    /// `get_f32`.
    Float,
    /// `get_f64`.
    Double,
}

impl Accessor {
    /// Looks up the accessor for a declared type.
    pub fn for_type(column_type: ColumnType) -> Option<Self> {
        match column_type {
            ColumnType::Int8 => Some(Accessor::Int8),
            ColumnType::Int16 => Some(Accessor::Int16),
            ColumnType::Int32 => Some(Accessor::Int32),
            ColumnType::Int64 | ColumnType::UnixtimeMicros => Some(Accessor::Int64),
            ColumnType::Binary => Some(Accessor::Binary),
            ColumnType::String => Some(Accessor::String),
            ColumnType::Bool => Some(Accessor::Bool),
            ColumnType::Float => Some(Accessor::Float),
            ColumnType::Double => Some(Accessor::Double),
            ColumnType::Decimal | ColumnType::Varchar | ColumnType::Date => None,
        }
    }

    /// Looks up the accessor for a column, rejecting unsupported types.
    pub fn for_column(column: &ColumnDescriptor) -> TabulaResult<Self> {
        Self::for_type(column.column_type()).ok_or_else(|| TabulaError::UnsupportedColumnType {
            column: column.name().to_string(),
            column_type: column.column_type(),
        })
    }

    /// Reads one cell and copies it out of the row.
    pub fn read<R: RawRow + ?Sized>(self, row: &R, column: &str) -> StoreResult<Value> {
        Ok(match self {
            Accessor::Int8 => Value::Int8(row.get_i8(column)?),
            Accessor::Int16 => Value::Int16(row.get_i16(column)?),
            Accessor::Int32 => Value::Int32(row.get_i32(column)?),
            Accessor::Int64 => Value::Int64(row.get_i64(column)?),
            Accessor::Binary => Value::Binary(Bytes::copy_from_slice(row.get_binary(column)?)),
            Accessor::String => Value::String(row.get_string(column)?.to_owned()),
            Accessor::Bool => Value::Bool(row.get_bool(column)?),
            Accessor::Float => Value::Float(row.get_f32(column)?),
            Accessor::Double => Value::Double(row.get_f64(column)?),
        })
    }
}

/// Extracts one column value from a row by declared type.
pub fn extract<R: RawRow + ?Sized>(
    column_type: ColumnType,
    column: &str,
    row: &R,
) -> TabulaResult<Value> {
    let accessor =
        Accessor::for_type(column_type).ok_or_else(|| TabulaError::UnsupportedColumnType {
            column: column.to_string(),
            column_type,
        })?;
    accessor
        .read(row, column)
        .map_err(|e| TabulaError::column_read(column, e))
}

#[derive(Debug, Clone)]
struct PlannedColumn {
    name: String,
    nullable: bool,
    accessor: Accessor,
}

impl PlannedColumn {
    fn read<R: RawRow + ?Sized>(&self, row: &R) -> StoreResult<Value> {
        if self.nullable && row.is_null(&self.name)? {
            return Ok(Value::Null);
        }
        self.accessor.read(row, &self.name)
    }
}

/// Per-scan accessor table, one entry per schema column in schema order.
#[derive(Debug, Clone)]
pub struct AccessPlan {
    columns: Vec<PlannedColumn>,
}

impl AccessPlan {
    /// Builds the plan for a schema.
    ///
    /// Fails on the first column whose type has no accessor.
    pub fn for_schema(schema: &Schema) -> TabulaResult<Self> {
        let columns = schema
            .iter()
            .map(|column| {
                Ok(PlannedColumn {
                    name: column.name().to_string(),
                    nullable: column.is_nullable(),
                    accessor: Accessor::for_column(column)?,
                })
            })
            .collect::<TabulaResult<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Number of columns read per row.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the plan reads no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Builds one record from a row.
    ///
    /// Null cells of nullable columns become `Value::Null`; non-nullable
    /// columns always go through their typed getter.
    pub fn project<R: RawRow + ?Sized>(&self, row: &R) -> TabulaResult<Record> {
        let mut record = Record::with_capacity(self.columns.len());
        for column in &self.columns {
            let value = column
                .read(row)
                .map_err(|e| TabulaError::column_read(&column.name, e))?;
            record.insert(column.name.as_str(), value);
        }
        Ok(record)
    }
}
