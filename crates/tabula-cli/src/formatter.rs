//! Output formatting for scans and schemas.
//!
//! Supports table, JSON, CSV, and raw output formats.

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::{json, Value as JsonValue};

use tabula_common::{Record, Schema, Value};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output.
    Json,
    /// CSV output.
    Csv,
    /// Raw output (values separated by tabs).
    Raw,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "raw" => Ok(OutputFormat::Raw),
            other => Err(anyhow::anyhow!("unknown output format '{}'", other)),
        }
    }
}

/// Rows to print: a header and one text cell per value.
struct Grid {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Formats scanned records in schema column order.
pub fn format_records(schema: &Schema, records: &[Record], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => records_json(records),
        _ => {
            let grid = Grid {
                columns: schema.names().into_iter().map(str::to_string).collect(),
                rows: records
                    .iter()
                    .map(|record| {
                        schema
                            .iter()
                            .map(|c| record.get(c.name()).map(value_text).unwrap_or_default())
                            .collect()
                    })
                    .collect(),
            };
            format_grid(&grid, format)
        }
    }
}

/// Formats a schema as one line per column.
pub fn format_schema(schema: &Schema, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let columns: Vec<JsonValue> = schema
                .iter()
                .map(|c| {
                    json!({
                        "name": c.name(),
                        "type": c.column_type().name(),
                        "nullable": c.is_nullable(),
                        "default": c.default_value().map(value_to_json),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&columns).unwrap_or_else(|_| "[]".to_string())
        }
        _ => {
            let grid = Grid {
                columns: ["name", "type", "nullable", "default"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                rows: schema
                    .iter()
                    .map(|c| {
                        vec![
                            c.name().to_string(),
                            c.column_type().to_string(),
                            c.is_nullable().to_string(),
                            c.default_value().map(value_text).unwrap_or_default(),
                        ]
                    })
                    .collect(),
            };
            format_grid(&grid, format)
        }
    }
}

fn format_grid(grid: &Grid, format: OutputFormat) -> String {
    match format {
        OutputFormat::Csv => format_csv(grid),
        OutputFormat::Raw => format_raw(grid),
        _ => format_table(grid),
    }
}

/// Formats the grid as a table.
fn format_table(grid: &Grid) -> String {
    let mut table = Table::new();

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    if !grid.columns.is_empty() {
        table.set_header(grid.columns.iter().map(Cell::new));
    }

    for row in &grid.rows {
        table.add_row(row.iter().map(Cell::new));
    }

    table.to_string()
}

/// Formats records as a JSON array of objects.
fn records_json(records: &[Record]) -> String {
    let rows: Vec<JsonValue> = records
        .iter()
        .map(|record| {
            let mut obj = serde_json::Map::new();
            for (name, value) in record.iter() {
                obj.insert(name.to_string(), value_to_json(value));
            }
            JsonValue::Object(obj)
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

/// Converts a value to JSON. Binary values become base64 strings.
fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Int8(v) => json!(*v),
        Value::Int16(v) => json!(*v),
        Value::Int32(v) => json!(*v),
        Value::Int64(v) => json!(*v),
        Value::Binary(b) => json!(STANDARD.encode(b)),
        Value::String(s) => json!(s),
        Value::Bool(b) => json!(*b),
        Value::Float(f) => json!(*f),
        Value::Double(d) => json!(*d),
    }
}

/// Text for one value in table, CSV, and raw output.
fn value_text(value: &Value) -> String {
    match value {
        Value::Binary(b) => STANDARD.encode(b),
        other => other.to_string(),
    }
}

/// Formats the grid as CSV.
fn format_csv(grid: &Grid) -> String {
    let mut output = String::new();

    if !grid.columns.is_empty() {
        let header: Vec<String> = grid.columns.iter().map(|c| escape_csv(c)).collect();
        output.push_str(&header.join(","));
        output.push('\n');
    }

    for row in &grid.rows {
        let values: Vec<String> = row.iter().map(|v| escape_csv(v)).collect();
        output.push_str(&values.join(","));
        output.push('\n');
    }

    output
}

/// Escapes a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Formats the grid as raw tab-separated values.
fn format_raw(grid: &Grid) -> String {
    let mut output = String::new();

    if !grid.columns.is_empty() {
        output.push_str(&grid.columns.join("\t"));
        output.push('\n');
    }

    for row in &grid.rows {
        output.push_str(&row.join("\t"));
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tabula_common::{ColumnDescriptor, ColumnType};

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnDescriptor::not_null("id", ColumnType::Int32),
            ColumnDescriptor::nullable("name", ColumnType::String),
            ColumnDescriptor::nullable("blob", ColumnType::Binary),
        ])
    }

    fn records() -> Vec<Record> {
        vec![
            Record::from_iter([
                ("id", Value::Int32(1)),
                ("name", Value::from("Alice, Jr.")),
                ("blob", Value::Binary(Bytes::from_static(b"hey"))),
            ]),
            Record::from_iter([
                ("id", Value::Int32(2)),
                ("name", Value::Null),
                ("blob", Value::Null),
            ]),
        ]
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_table() {
        let output = format_records(&schema(), &records(), OutputFormat::Table);
        assert!(output.contains("id"));
        assert!(output.contains("Alice, Jr."));
        assert!(output.contains("aGV5"));
        assert!(output.contains("NULL"));
    }

    #[test]
    fn test_format_json() {
        let output = format_records(&schema(), &records(), OutputFormat::Json);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["id"], json!(1));
        assert_eq!(parsed[0]["blob"], json!("aGV5"));
        assert!(parsed[1]["name"].is_null());
    }

    #[test]
    fn test_format_csv() {
        let output = format_records(&schema(), &records(), OutputFormat::Csv);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,name,blob");
        assert_eq!(lines[1], "1,\"Alice, Jr.\",aGV5");
    }

    #[test]
    fn test_empty_scan_keeps_header() {
        let output = format_records(&schema(), &[], OutputFormat::Raw);
        assert_eq!(output, "id\tname\tblob\n");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("hello"), "hello");
        assert_eq!(escape_csv("hello,world"), "\"hello,world\"");
        assert_eq!(escape_csv("hello\"world"), "\"hello\"\"world\"");
    }

    #[test]
    fn test_format_schema() {
        let schema = schema().with_column(
            ColumnDescriptor::not_null("score", ColumnType::Int64).with_default(Value::Int64(0)),
        );
        let raw = format_schema(&schema, OutputFormat::Raw);
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines[0], "name\ttype\tnullable\tdefault");
        assert_eq!(lines[1], "id\tINT32\tfalse\t");
        assert_eq!(lines[4], "score\tINT64\tfalse\t0");

        let json: Vec<serde_json::Value> =
            serde_json::from_str(&format_schema(&schema, OutputFormat::Json)).unwrap();
        assert_eq!(json[3]["default"], json!(0));
        assert!(json[0]["default"].is_null());
    }
}
