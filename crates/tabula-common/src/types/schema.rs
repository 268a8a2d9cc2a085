//! Ordered table schemas.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::column::ColumnDescriptor;

/// Ordered column descriptors of one table.
///
/// Order defines record field order; column identity is the name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDescriptor>,
}

impl Schema {
    /// Creates a schema from ordered columns.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    /// Creates an empty schema.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column at `index`.
    pub fn column_at(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Returns the position of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Returns the column names in order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnDescriptor::name).collect()
    }

    /// Iterates over the columns.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    /// Returns a copy with `column` appended.
    pub fn with_column(&self, column: ColumnDescriptor) -> Self {
        let mut columns = self.columns.clone();
        columns.push(column);
        Self { columns }
    }

    /// Returns a copy without the named column.
    pub fn without_column(&self, name: &str) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| c.name() != name)
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", column)?;
        }
        write!(f, ")")
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ColumnDescriptor;
    type IntoIter = std::slice::Iter<'a, ColumnDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;

    fn test_schema() -> Schema {
        Schema::new(vec![
            ColumnDescriptor::not_null("id", ColumnType::Int32),
            ColumnDescriptor::nullable("name", ColumnType::String),
        ])
    }

    #[test]
    fn test_schema_lookup() {
        let schema = test_schema();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.index_of("name"), Some(1));
        assert_eq!(
            schema.column("id").map(|c| c.column_type()),
            Some(ColumnType::Int32)
        );
        assert!(schema.column("missing").is_none());
    }

    #[test]
    fn test_schema_alteration_copies() {
        let schema = test_schema();
        let added = schema.with_column(ColumnDescriptor::nullable("ts", ColumnType::UnixtimeMicros));
        assert_eq!(added.names(), vec!["id", "name", "ts"]);
        assert_eq!(schema.len(), 2);

        let dropped = added.without_column("name");
        assert_eq!(dropped.names(), vec!["id", "ts"]);
    }

    #[test]
    fn test_schema_display() {
        assert_eq!(test_schema().to_string(), "(id INT32 NOT NULL, name STRING)");
    }
}
