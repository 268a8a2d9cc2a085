//! The table helper.
//!
//! `TableHelper` is the entry surface: it owns a store client and its
//! configuration, optionally binds one table, and offers scans, schema
//! lookups and add/drop column pass-throughs.

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use tabula_common::{
    ClientConfig, ColumnType, Record, Schema, TabulaError, TabulaResult, Value,
};

use crate::projector::{Projection, RowProjector, ScanLimit};
use crate::resolver::{SchemaResolver, TableRef};
use crate::store::{AlterTableOptions, ScanOptions, TableHandle, TableStore};

/// Statistics about helper usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperStats {
    /// Scans started.
    pub scans: u64,
    /// Scans that returned an error.
    pub failed_scans: u64,
    /// Scans cut short by their limit.
    pub truncated_scans: u64,
    /// Records returned by successful scans.
    pub rows_emitted: u64,
    /// Pages fetched by successful scans.
    pub pages_fetched: u64,
    /// Table lookups sent to the store.
    pub table_lookups: u64,
    /// Alter requests that succeeded.
    pub alters: u64,
}

/// Schema-driven access to the tables of one store.
pub struct TableHelper<S: TableStore> {
    /// Configuration.
    config: ClientConfig,
    /// Store client.
    store: S,
    /// Scanner options derived from the configuration.
    options: ScanOptions,
    /// Name lookups, optionally cached.
    resolver: SchemaResolver<S::Table>,
    /// Bound table, if any.
    bound: RwLock<Option<S::Table>>,
    /// Statistics.
    stats: RwLock<HelperStats>,
}

impl<S: TableStore> TableHelper<S> {
    /// Creates a helper.
    ///
    /// Binds `config.default_table` when it is set, failing if that table
    /// does not resolve.
    pub fn new(store: S, config: ClientConfig) -> TabulaResult<Self> {
        config.validate()?;

        let resolver = if config.schema_cache {
            SchemaResolver::cached()
        } else {
            SchemaResolver::new()
        };
        let helper = Self {
            options: ScanOptions::from_config(&config),
            config,
            store,
            resolver,
            bound: RwLock::new(None),
            stats: RwLock::new(HelperStats::default()),
        };

        if let Some(table) = helper.config.default_table.clone() {
            helper.bind_table(&table)?;
        }
        Ok(helper)
    }

    /// Creates a helper bound to `table`.
    pub fn with_table(store: S, mut config: ClientConfig, table: &str) -> TabulaResult<Self> {
        config.default_table = Some(table.to_string());
        Self::new(store, config)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the store client.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the scanner options used for every scan.
    pub fn scan_options(&self) -> ScanOptions {
        self.options
    }

    /// Returns helper statistics.
    pub fn stats(&self) -> HelperStats {
        let mut stats = self.stats.read().clone();
        stats.table_lookups = self.resolver.lookups();
        stats
    }

    // =========================================================================
    // Table Binding
    // =========================================================================

    /// Opens `name` and makes it the bound table.
    ///
    /// On failure the previous binding is kept.
    pub fn bind_table(&self, name: &str) -> TabulaResult<()> {
        let handle = self.resolver.open(&self.store, name)?;
        info!(table = %name, columns = handle.schema().len(), "bound table");
        *self.bound.write() = Some(handle);
        Ok(())
    }

    /// Clears the bound table.
    pub fn unbind_table(&self) {
        *self.bound.write() = None;
    }

    /// Returns the name of the bound table.
    pub fn bound_table(&self) -> Option<String> {
        self.bound.read().as_ref().map(|t| t.name().to_string())
    }

    fn bound_handle(&self) -> TabulaResult<S::Table> {
        self.bound.read().clone().ok_or(TabulaError::NoTableBound)
    }

    // =========================================================================
    // Scans
    // =========================================================================

    /// Scans the bound table. A negative `limit` scans every row.
    pub fn scan(&self, limit: i64) -> TabulaResult<Vec<Record>> {
        self.scan_with(None, ScanLimit::from(limit))
            .map(|projection| projection.records)
    }

    /// Scans a table by name. A negative `limit` scans every row.
    ///
    /// The name is looked up on every call unless the schema cache is on.
    pub fn scan_table(&self, table: &str, limit: i64) -> TabulaResult<Vec<Record>> {
        self.scan_with(Some(table), ScanLimit::from(limit))
            .map(|projection| projection.records)
    }

    /// Scans `table`, or the bound table when `None`, returning the summary too.
    pub fn scan_with(&self, table: Option<&str>, limit: ScanLimit) -> TabulaResult<Projection> {
        self.stats.write().scans += 1;

        let result = self.target(table).and_then(|handle| {
            RowProjector::new(&self.store, self.options).scan(&handle, limit)
        });

        let mut stats = self.stats.write();
        match &result {
            Ok(projection) => {
                stats.rows_emitted += projection.summary.rows as u64;
                stats.pages_fetched += projection.summary.pages as u64;
                if projection.summary.truncated {
                    stats.truncated_scans += 1;
                }
            }
            Err(e) => {
                stats.failed_scans += 1;
                debug!(table = ?table, error = %e, "scan failed");
            }
        }
        result
    }

    fn target(&self, table: Option<&str>) -> TabulaResult<S::Table> {
        match table {
            Some(name) => self.resolver.open(&self.store, name),
            None => self.bound_handle(),
        }
    }

    // =========================================================================
    // Schemas
    // =========================================================================

    /// Returns the schema of the bound table.
    pub fn schema(&self) -> TabulaResult<Schema> {
        self.table_schema(None)
    }

    /// Returns the schema of `table`, or of the bound table when `None`.
    pub fn table_schema(&self, table: Option<&str>) -> TabulaResult<Schema> {
        match table {
            Some(name) => self.resolver.resolve(&self.store, TableRef::Name(name)),
            None => {
                let handle = self.bound_handle()?;
                self.resolver.resolve(&self.store, TableRef::Handle(&handle))
            }
        }
    }

    // =========================================================================
    // Schema Changes
    // =========================================================================

    /// Adds a column to the bound table.
    ///
    /// A nullable column is added without a default, so `default` is only
    /// used for non-nullable columns. A non-nullable column without a
    /// default is sent as is and left for the store to reject.
    pub fn add_column(
        &self,
        name: &str,
        column_type: ColumnType,
        nullable: bool,
        default: Option<Value>,
    ) -> TabulaResult<()> {
        let table = self.bound_handle()?;
        let options = if nullable {
            if default.is_some() {
                debug!(column = %name, "ignoring default for nullable column");
            }
            AlterTableOptions::new().add_nullable_column(name, column_type)
        } else {
            AlterTableOptions::new().add_column(
                name,
                column_type,
                default.unwrap_or(Value::Null),
            )
        };
        self.alter_table(table.name(), &options)
    }

    /// Drops a column from the bound table.
    pub fn drop_column(&self, name: &str) -> TabulaResult<()> {
        let table = self.bound_handle()?;
        self.alter_table(table.name(), &AlterTableOptions::new().drop_column(name))
    }

    /// Sends an alter request for any table.
    pub fn alter_table(&self, table: &str, options: &AlterTableOptions) -> TabulaResult<()> {
        self.store
            .alter_table(table, options)
            .map_err(|e| TabulaError::alter(table, e))?;
        self.stats.write().alters += 1;
        info!(table = %table, steps = options.steps().len(), "altered table");

        self.resolver.invalidate(table);
        self.refresh_binding(table);
        Ok(())
    }

    /// Reopens the bound table after it changed so its schema is current.
    fn refresh_binding(&self, table: &str) {
        if self.bound_table().as_deref() != Some(table) {
            return;
        }
        match self.resolver.open(&self.store, table) {
            Ok(handle) => *self.bound.write() = Some(handle),
            Err(e) => warn!(table = %table, error = %e, "failed to reopen altered table"),
        }
    }
}

impl<S: TableStore> std::fmt::Debug for TableHelper<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHelper")
            .field("masters", &self.config.masters_string())
            .field("bound_table", &self.bound_table())
            .field("resolver", &self.resolver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FaultPlan, MemoryStore};
    use tabula_common::{ColumnDescriptor, StoreError};

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_table(
                "T",
                Schema::new(vec![
                    ColumnDescriptor::not_null("id", ColumnType::Int32),
                    ColumnDescriptor::not_null("name", ColumnType::String),
                ]),
            )
            .unwrap();
        for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")] {
            store
                .insert_values("T", vec![Value::Int32(id), Value::from(name)])
                .unwrap();
        }
        store
    }

    #[test]
    fn test_new_without_table() {
        let helper = TableHelper::new(store(), ClientConfig::default()).unwrap();
        assert_eq!(helper.bound_table(), None);
        assert!(matches!(helper.scan(-1), Err(TabulaError::NoTableBound)));
        assert!(matches!(helper.schema(), Err(TabulaError::NoTableBound)));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ClientConfig {
            scan_batch_size_rows: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(
            TableHelper::new(store(), config),
            Err(TabulaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_binding_missing_table_fails() {
        let err = TableHelper::with_table(store(), ClientConfig::default(), "nope").unwrap_err();
        assert!(matches!(err, TabulaError::TableNotFound(name) if name == "nope"));
    }

    #[test]
    fn test_bound_scan_skips_lookup() {
        let store = store();
        let helper = TableHelper::with_table(store.clone(), ClientConfig::default(), "T").unwrap();
        helper.scan(-1).unwrap();
        helper.scan(2).unwrap();
        assert_eq!(store.probe().table_lookups, 1);

        helper.scan_table("T", 1).unwrap();
        helper.scan_table("T", 1).unwrap();
        assert_eq!(store.probe().table_lookups, 3);
    }

    #[test]
    fn test_stats() {
        let config = ClientConfig {
            scan_batch_size_rows: 2,
            ..ClientConfig::default()
        };
        let helper = TableHelper::with_table(store(), config, "T").unwrap();
        helper.scan(3).unwrap();
        helper.scan(-1).unwrap();
        assert!(helper.scan_table("missing", -1).is_err());

        let stats = helper.stats();
        assert_eq!(stats.scans, 3);
        assert_eq!(stats.failed_scans, 1);
        assert_eq!(stats.truncated_scans, 1);
        assert_eq!(stats.rows_emitted, 8);
        assert_eq!(stats.pages_fetched, 5);
        assert_eq!(stats.table_lookups, 2);
    }

    #[test]
    fn test_rebind() {
        let store = store();
        store.create_table("U", Schema::empty()).unwrap();
        let helper = TableHelper::with_table(store, ClientConfig::default(), "T").unwrap();

        assert!(helper.bind_table("missing").is_err());
        assert_eq!(helper.bound_table().as_deref(), Some("T"));

        helper.bind_table("U").unwrap();
        assert_eq!(helper.bound_table().as_deref(), Some("U"));
        assert!(helper.scan(-1).unwrap().is_empty());

        helper.unbind_table();
        assert_eq!(helper.bound_table(), None);
    }

    #[test]
    fn test_add_column_refreshes_bound_schema() {
        let helper = TableHelper::with_table(store(), ClientConfig::default(), "T").unwrap();
        helper
            .add_column("score", ColumnType::Int64, false, Some(Value::Int64(10)))
            .unwrap();
        helper
            .add_column("note", ColumnType::String, true, Some(Value::from("ignored")))
            .unwrap();

        assert_eq!(helper.schema().unwrap().names(), vec!["id", "name", "score", "note"]);
        let records = helper.scan(1).unwrap();
        assert_eq!(records[0].get("score"), Some(&Value::Int64(10)));
        assert_eq!(records[0].get("note"), Some(&Value::Null));
        assert_eq!(helper.stats().alters, 2);
    }

    #[test]
    fn test_add_required_column_without_default_fails() {
        let helper = TableHelper::with_table(store(), ClientConfig::default(), "T").unwrap();
        let err = helper
            .add_column("score", ColumnType::Int64, false, None)
            .unwrap_err();
        assert!(matches!(
            err,
            TabulaError::Alter { ref table, source: StoreError::SchemaMismatch(_) } if table == "T"
        ));
        assert_eq!(helper.stats().alters, 0);
    }

    #[test]
    fn test_drop_column() {
        let helper = TableHelper::with_table(store(), ClientConfig::default(), "T").unwrap();
        helper.drop_column("name").unwrap();
        let records = helper.scan(-1).unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].column_names(), vec!["id"]);

        assert!(matches!(
            helper.drop_column("name"),
            Err(TabulaError::Alter { source: StoreError::ColumnMissing(_), .. })
        ));
    }

    #[test]
    fn test_alter_failure() {
        let store = store();
        let helper = TableHelper::with_table(store.clone(), ClientConfig::default(), "T").unwrap();
        store.set_faults(FaultPlan {
            fail_alter: true,
            ..FaultPlan::default()
        });
        assert!(matches!(
            helper.drop_column("name"),
            Err(TabulaError::Alter { .. })
        ));
        store.clear_faults();
        assert_eq!(helper.schema().unwrap().len(), 2);
    }

    #[test]
    fn test_schema_cache_invalidated_by_alter() {
        let store = store();
        let config = ClientConfig {
            schema_cache: true,
            ..ClientConfig::default()
        };
        let helper = TableHelper::new(store.clone(), config).unwrap();

        helper.table_schema(Some("T")).unwrap();
        helper.table_schema(Some("T")).unwrap();
        assert_eq!(store.probe().table_lookups, 1);

        let options = AlterTableOptions::new().add_nullable_column("extra", ColumnType::Bool);
        helper.alter_table("T", &options).unwrap();
        let schema = helper.table_schema(Some("T")).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(store.probe().table_lookups, 2);
    }
}
