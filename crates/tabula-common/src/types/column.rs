//! Column types and column descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::error::TabulaError;

/// Column types declared by the table store.
///
/// The first ten variants are the projectable set. `Decimal`, `Varchar` and
/// `Date` exist on the store side but have no row accessor, so scanning a
/// table that declares one fails with `UnsupportedColumnType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Microseconds since the Unix epoch, stored as a 64-bit integer.
    UnixtimeMicros,
    /// Variable-length byte sequence.
    Binary,
    /// UTF-8 string.
    String,
    /// Boolean.
    Bool,
    /// 32-bit IEEE float.
    Float,
    /// 64-bit IEEE float.
    Double,
    /// Fixed-point decimal.
    Decimal,
    /// Length-bounded string.
    Varchar,
    /// Days since the Unix epoch.
    Date,
}

impl ColumnType {
    /// Every type the store knows about, in declaration order.
    pub const ALL: [ColumnType; 13] = [
        ColumnType::Int8,
        ColumnType::Int16,
        ColumnType::Int32,
        ColumnType::Int64,
        ColumnType::UnixtimeMicros,
        ColumnType::Binary,
        ColumnType::String,
        ColumnType::Bool,
        ColumnType::Float,
        ColumnType::Double,
        ColumnType::Decimal,
        ColumnType::Varchar,
        ColumnType::Date,
    ];

    /// Returns the store's canonical name for this type.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int8 => "INT8",
            ColumnType::Int16 => "INT16",
            ColumnType::Int32 => "INT32",
            ColumnType::Int64 => "INT64",
            ColumnType::UnixtimeMicros => "UNIXTIME_MICROS",
            ColumnType::Binary => "BINARY",
            ColumnType::String => "STRING",
            ColumnType::Bool => "BOOL",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Decimal => "DECIMAL",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Date => "DATE",
        }
    }

    /// Returns true if rows of this type can be projected into a `Value`.
    pub fn is_projectable(&self) -> bool {
        !matches!(
            self,
            ColumnType::Decimal | ColumnType::Varchar | ColumnType::Date
        )
    }

    /// Returns true if `value` is a legal non-null value for this type.
    ///
    /// Timestamps are carried as `Int64`, so both `INT64` and
    /// `UNIXTIME_MICROS` accept the same value kind.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ColumnType::Int8, Value::Int8(_))
                | (ColumnType::Int16, Value::Int16(_))
                | (ColumnType::Int32, Value::Int32(_))
                | (ColumnType::Int64 | ColumnType::UnixtimeMicros, Value::Int64(_))
                | (ColumnType::Binary, Value::Binary(_))
                | (ColumnType::String, Value::String(_))
                | (ColumnType::Bool, Value::Bool(_))
                | (ColumnType::Float, Value::Float(_))
                | (ColumnType::Double, Value::Double(_))
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ColumnType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TabulaError::InvalidColumnType(s.to_string()))
    }
}

/// Schema metadata for one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
}

impl ColumnDescriptor {
    /// Creates a new column descriptor.
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
            default: None,
        }
    }

    /// Creates a non-nullable column.
    pub fn not_null(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, false)
    }

    /// Creates a nullable column.
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, true)
    }

    /// Sets the default value reported for this column.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Returns true if the column admits nulls.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the default value, if the column has one.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", default)?;
        }
        Ok(())
    }
}
