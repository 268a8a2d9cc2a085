//! Store-side cell values.

use bytes::Bytes;

use tabula_common::{ColumnType, Value};

/// One stored cell.
///
/// Unlike [`Value`], cells cover every store type, including the ones row
/// projection rejects.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Null cell.
    Null,
    /// `INT8`.
    Int8(i8),
    /// `INT16`.
    Int16(i16),
    /// `INT32`.
    Int32(i32),
    /// `INT64` or `UNIXTIME_MICROS`.
    Int64(i64),
    /// `BINARY`.
    Binary(Bytes),
    /// `STRING`.
    String(String),
    /// `BOOL`.
    Bool(bool),
    /// `FLOAT`.
    Float(f32),
    /// `DOUBLE`.
    Double(f64),
    /// `DECIMAL`, as an unscaled integer.
    Decimal(i128),
    /// `VARCHAR`.
    Varchar(String),
    /// `DATE`, as days since the epoch.
    Date(i32),
}

impl Cell {
    /// Returns true if the cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Returns true if this cell may be stored in a column of `column_type`.
    ///
    /// Null fits every type; nullability is checked separately.
    pub fn fits(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (Cell::Null, _)
                | (Cell::Int8(_), ColumnType::Int8)
                | (Cell::Int16(_), ColumnType::Int16)
                | (Cell::Int32(_), ColumnType::Int32)
                | (Cell::Int64(_), ColumnType::Int64 | ColumnType::UnixtimeMicros)
                | (Cell::Binary(_), ColumnType::Binary)
                | (Cell::String(_), ColumnType::String)
                | (Cell::Bool(_), ColumnType::Bool)
                | (Cell::Float(_), ColumnType::Float)
                | (Cell::Double(_), ColumnType::Double)
                | (Cell::Decimal(_), ColumnType::Decimal)
                | (Cell::Varchar(_), ColumnType::Varchar)
                | (Cell::Date(_), ColumnType::Date)
        )
    }

    /// Returns a short name for the cell kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Int8(_) => "int8",
            Cell::Int16(_) => "int16",
            Cell::Int32(_) => "int32",
            Cell::Int64(_) => "int64",
            Cell::Binary(_) => "binary",
            Cell::String(_) => "string",
            Cell::Bool(_) => "bool",
            Cell::Float(_) => "float",
            Cell::Double(_) => "double",
            Cell::Decimal(_) => "decimal",
            Cell::Varchar(_) => "varchar",
            Cell::Date(_) => "date",
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Int8(v) => Cell::Int8(v),
            Value::Int16(v) => Cell::Int16(v),
            Value::Int32(v) => Cell::Int32(v),
            Value::Int64(v) => Cell::Int64(v),
            Value::Binary(v) => Cell::Binary(v),
            Value::String(v) => Cell::String(v),
            Value::Bool(v) => Cell::Bool(v),
            Value::Float(v) => Cell::Float(v),
            Value::Double(v) => Cell::Double(v),
        }
    }
}
