//! JSON fixtures for the in-memory store.
//!
//! A fixture lists tables with their columns and rows:
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "name": "T",
//!       "columns": [
//!         { "name": "id", "type": "INT32" },
//!         { "name": "name", "type": "STRING", "nullable": true }
//!       ],
//!       "rows": [[1, "a"], [2, null]]
//!     }
//!   ]
//! }
//! ```
//!
//! Binary cells are base64 strings. `DECIMAL` cells are unscaled integers
//! and `DATE` cells are days since the epoch.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use tabula_client::{Cell, MemoryStore};
use tabula_common::{ColumnDescriptor, ColumnType, Schema, Value};

/// A fixture file.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    /// Tables to create.
    pub tables: Vec<FixtureTable>,
}

/// One table of a fixture.
#[derive(Debug, Deserialize)]
pub struct FixtureTable {
    /// Table name.
    pub name: String,
    /// Columns in schema order.
    pub columns: Vec<FixtureColumn>,
    /// Rows, one JSON value per column.
    #[serde(default)]
    pub rows: Vec<Vec<JsonValue>>,
}

/// One column of a fixture table.
#[derive(Debug, Deserialize)]
pub struct FixtureColumn {
    /// Column name.
    pub name: String,
    /// Declared type name, case-insensitive.
    #[serde(rename = "type")]
    pub column_type: String,
    /// Whether the column accepts nulls.
    #[serde(default)]
    pub nullable: bool,
}

impl Fixture {
    /// Parses a fixture from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads a fixture file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing fixture {}", path.display()))
    }

    /// Creates every table of the fixture in a new store.
    pub fn into_store(self) -> Result<MemoryStore> {
        let store = MemoryStore::new();
        for table in self.tables {
            let schema = table.schema()?;
            store.create_table(&table.name, schema.clone())?;
            for (i, row) in table.rows.iter().enumerate() {
                let cells = row_cells(&schema, row)
                    .with_context(|| format!("table '{}', row {}", table.name, i))?;
                store.insert(&table.name, cells)?;
            }
            debug!(table = %table.name, rows = table.rows.len(), "loaded fixture table");
        }
        Ok(store)
    }
}

impl FixtureTable {
    fn schema(&self) -> Result<Schema> {
        let columns = self
            .columns
            .iter()
            .map(|c| -> Result<ColumnDescriptor> {
                let column_type: ColumnType = c.column_type.parse()?;
                Ok(ColumnDescriptor::new(&c.name, column_type, c.nullable))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Schema::new(columns))
    }
}

/// Loads a fixture file into a new store.
pub fn load(path: &Path) -> Result<MemoryStore> {
    Fixture::from_file(path)?.into_store()
}

fn row_cells(schema: &Schema, row: &[JsonValue]) -> Result<Vec<Cell>> {
    if row.len() != schema.len() {
        bail!("expected {} values, got {}", schema.len(), row.len());
    }
    schema
        .iter()
        .zip(row)
        .map(|(column, json)| {
            json_to_cell(column.column_type(), json)
                .with_context(|| format!("column '{}'", column.name()))
        })
        .collect()
}

/// Converts a JSON value to a store cell of the given type.
pub fn json_to_cell(column_type: ColumnType, json: &JsonValue) -> Result<Cell> {
    if json.is_null() {
        return Ok(Cell::Null);
    }
    Ok(match column_type {
        ColumnType::Decimal => Cell::Decimal(i128::from(integer(json)?)),
        ColumnType::Varchar => Cell::Varchar(text(json)?.to_string()),
        ColumnType::Date => Cell::Date(i32::try_from(integer(json)?)?),
        _ => Cell::from(json_to_value(column_type, json)?),
    })
}

/// Converts a JSON value to a projected value of the given type.
///
/// Fails for types that have no `Value` representation.
pub fn json_to_value(column_type: ColumnType, json: &JsonValue) -> Result<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    Ok(match column_type {
        ColumnType::Int8 => Value::Int8(i8::try_from(integer(json)?)?),
        ColumnType::Int16 => Value::Int16(i16::try_from(integer(json)?)?),
        ColumnType::Int32 => Value::Int32(i32::try_from(integer(json)?)?),
        ColumnType::Int64 | ColumnType::UnixtimeMicros => Value::Int64(integer(json)?),
        ColumnType::Binary => Value::Binary(Bytes::from(STANDARD.decode(text(json)?)?)),
        ColumnType::String => Value::String(text(json)?.to_string()),
        ColumnType::Bool => Value::Bool(
            json.as_bool()
                .ok_or_else(|| anyhow!("expected a boolean, got {}", json))?,
        ),
        ColumnType::Float => Value::Float(number(json)? as f32),
        ColumnType::Double => Value::Double(number(json)?),
        ColumnType::Decimal | ColumnType::Varchar | ColumnType::Date => {
            bail!("{} values cannot be given here", column_type)
        }
    })
}

fn integer(json: &JsonValue) -> Result<i64> {
    json.as_i64()
        .ok_or_else(|| anyhow!("expected an integer, got {}", json))
}

fn number(json: &JsonValue) -> Result<f64> {
    json.as_f64()
        .ok_or_else(|| anyhow!("expected a number, got {}", json))
}

fn text(json: &JsonValue) -> Result<&str> {
    json.as_str()
        .ok_or_else(|| anyhow!("expected a string, got {}", json))
}
