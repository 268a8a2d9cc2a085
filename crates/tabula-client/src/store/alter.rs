//! Schema-change requests.

use tabula_common::{ColumnDescriptor, ColumnType, Value};

/// One schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterStep {
    /// Add a column. Existing rows take `default`, or null when absent.
    AddColumn {
        /// The new column.
        column: ColumnDescriptor,
        /// Value for existing rows.
        default: Option<Value>,
    },
    /// Drop a column by name.
    DropColumn(String),
}

/// An ordered batch of schema changes sent in one alter request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlterTableOptions {
    steps: Vec<AlterStep>,
}

impl AlterTableOptions {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a nullable column with no default.
    pub fn add_nullable_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.steps.push(AlterStep::AddColumn {
            column: ColumnDescriptor::nullable(name, column_type),
            default: None,
        });
        self
    }

    /// Adds a non-nullable column filled with `default`.
    pub fn add_column(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        default: Value,
    ) -> Self {
        self.steps.push(AlterStep::AddColumn {
            column: ColumnDescriptor::not_null(name, column_type).with_default(default.clone()),
            default: Some(default),
        });
        self
    }

    /// Drops a column.
    pub fn drop_column(mut self, name: impl Into<String>) -> Self {
        self.steps.push(AlterStep::DropColumn(name.into()));
        self
    }

    /// Returns the steps in order.
    pub fn steps(&self) -> &[AlterStep] {
        &self.steps
    }

    /// Returns true if the request changes nothing.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_keep_order() {
        let options = AlterTableOptions::new()
            .add_nullable_column("note", ColumnType::String)
            .add_column("score", ColumnType::Int64, Value::Int64(0))
            .drop_column("legacy");

        assert_eq!(options.steps().len(), 3);
        match &options.steps()[1] {
            AlterStep::AddColumn { column, default } => {
                assert_eq!(column.name(), "score");
                assert!(!column.is_nullable());
                assert_eq!(default, &Some(Value::Int64(0)));
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(options.steps()[2], AlterStep::DropColumn("legacy".into()));
    }
}
