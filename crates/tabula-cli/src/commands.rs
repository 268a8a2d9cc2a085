//! Subcommand execution.
//!
//! Each command runs against a `TableHelper` over the fixture-backed store
//! and returns the text to print.

use anyhow::{Context, Result};
use tracing::info;

use tabula_client::{MemoryStore, ScanLimit, TableHelper};
use tabula_common::{ClientConfig, ColumnType};

use crate::fixture::json_to_value;
use crate::formatter::{format_records, format_schema, OutputFormat};

/// A helper session for one CLI invocation.
pub struct Session {
    helper: TableHelper<MemoryStore>,
    format: OutputFormat,
}

impl Session {
    /// Opens a session, binding the configured default table if any.
    pub fn open(store: MemoryStore, config: ClientConfig, format: OutputFormat) -> Result<Self> {
        info!(masters = %config.masters_string(), table = ?config.default_table, "opening session");
        let helper = TableHelper::new(store, config)?;
        Ok(Self { helper, format })
    }

    /// Scans the bound table.
    pub fn scan(&self, limit: i64) -> Result<String> {
        let projection = self.helper.scan_with(None, ScanLimit::from(limit))?;
        let schema = self.helper.schema()?;
        info!(
            rows = projection.summary.rows,
            pages = projection.summary.pages,
            truncated = projection.summary.truncated,
            "scan complete"
        );
        Ok(format_records(&schema, &projection.records, self.format))
    }

    /// Shows the schema of the bound table.
    pub fn schema(&self) -> Result<String> {
        Ok(format_schema(&self.helper.schema()?, self.format))
    }

    /// Adds a column to the bound table and shows the new schema.
    ///
    /// `default` is a JSON literal of the column's type.
    pub fn add_column(
        &self,
        name: &str,
        type_name: &str,
        nullable: bool,
        default: Option<&str>,
    ) -> Result<String> {
        let column_type: ColumnType = type_name.parse()?;
        let default = default
            .map(|text| -> Result<_> {
                let json: serde_json::Value = serde_json::from_str(text)
                    .with_context(|| format!("default {:?} is not a JSON literal", text))?;
                json_to_value(column_type, &json)
            })
            .transpose()?;

        self.helper.add_column(name, column_type, nullable, default)?;
        self.schema()
    }

    /// Drops a column from the bound table and shows the new schema.
    pub fn drop_column(&self, name: &str) -> Result<String> {
        self.helper.drop_column(name)?;
        self.schema()
    }

    /// Lists the tables of the store.
    pub fn tables(&self) -> String {
        let mut output = String::new();
        for name in self.helper.store().table_names() {
            output.push_str(&name);
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;
    use tabula_common::TabulaError;

    fn session(table: Option<&str>, format: OutputFormat) -> Session {
        let store = Fixture::from_json(
            r#"{"tables": [{
                "name": "T",
                "columns": [{"name": "id", "type": "INT32"}, {"name": "name", "type": "STRING"}],
                "rows": [[1, "a"], [2, "b"], [3, "c"], [4, "d"], [5, "e"]]
            }]}"#,
        )
        .unwrap()
        .into_store()
        .unwrap();
        let config = ClientConfig {
            default_table: table.map(str::to_string),
            ..ClientConfig::default()
        };
        Session::open(store, config, format).unwrap()
    }

    #[test]
    fn test_scan_with_limit() {
        let output = session(Some("T"), OutputFormat::Csv).scan(3).unwrap();
        assert_eq!(output, "id,name\n1,a\n2,b\n3,c\n");
    }

    #[test]
    fn test_scan_all() {
        let output = session(Some("T"), OutputFormat::Raw).scan(-1).unwrap();
        assert_eq!(output.lines().count(), 6);
    }

    #[test]
    fn test_scan_without_table() {
        let err = session(None, OutputFormat::Raw).scan(-1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TabulaError>(),
            Some(TabulaError::NoTableBound)
        ));
    }

    #[test]
    fn test_add_and_drop_column() {
        let session = session(Some("T"), OutputFormat::Raw);
        let schema = session
            .add_column("score", "int64", false, Some("42"))
            .unwrap();
        assert!(schema.contains("score\tINT64\tfalse\t42"));

        let output = session.scan(1).unwrap();
        assert_eq!(output, "id\tname\tscore\n1\ta\t42\n");

        let schema = session.drop_column("name").unwrap();
        assert!(!schema.contains("name\tSTRING"));
    }

    #[test]
    fn test_add_column_rejects_bad_input() {
        let session = session(Some("T"), OutputFormat::Raw);
        assert!(session.add_column("x", "uuid", true, None).is_err());
        assert!(session
            .add_column("x", "INT32", false, Some("not json"))
            .is_err());
    }

    #[test]
    fn test_tables() {
        assert_eq!(session(None, OutputFormat::Table).tables(), "T\n");
    }
}
