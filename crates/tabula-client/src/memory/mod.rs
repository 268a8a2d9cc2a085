//! In-process table store.
//!
//! `MemoryStore` implements the store traits over tables held in memory. It
//! backs the tests, the benches and the CLI's fixture mode, and it can be
//! told to fail at specific points so error paths can be exercised.
//!
//! Every cursor works on a snapshot of the table taken when the scanner was
//! opened. Cloning a `MemoryStore` shares its tables, faults and counters.

mod cell;
mod cursor;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use tabula_common::{ColumnDescriptor, Schema, StoreError, StoreResult, Value};

use crate::store::{AlterStep, AlterTableOptions, ScanOptions, TableHandle, TableStore};

pub use cell::Cell;
pub use cursor::{MemoryCursor, MemoryPage, MemoryRow};

use cursor::Rows;

/// Failures to inject into store calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Every call fails with `Unreachable`.
    pub unreachable: bool,
    /// Scanner construction fails.
    pub fail_scanner: bool,
    /// The page fetch with this zero-based index fails.
    pub fail_page: Option<usize>,
    /// Closing a scanner fails.
    pub fail_close: bool,
    /// Alter requests fail.
    pub fail_alter: bool,
}

/// Call counters shared by a store and its cursors.
#[derive(Debug, Default)]
pub(crate) struct Probe {
    table_lookups: AtomicU64,
    cursors_opened: AtomicU64,
    close_calls: AtomicU64,
    cursors_closed: AtomicU64,
    pages_fetched: AtomicU64,
    alters: AtomicU64,
}

impl Probe {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn page_fetched(&self) {
        Self::bump(&self.pages_fetched);
    }

    pub(crate) fn close_called(&self) {
        Self::bump(&self.close_calls);
    }

    pub(crate) fn cursor_closed(&self) {
        Self::bump(&self.cursors_closed);
    }

    pub(crate) fn snapshot(&self) -> ProbeSnapshot {
        ProbeSnapshot {
            table_lookups: self.table_lookups.load(Ordering::Relaxed),
            cursors_opened: self.cursors_opened.load(Ordering::Relaxed),
            close_calls: self.close_calls.load(Ordering::Relaxed),
            cursors_closed: self.cursors_closed.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            alters: self.alters.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the store's call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSnapshot {
    /// `open_table` calls.
    pub table_lookups: u64,
    /// Scanners handed out.
    pub cursors_opened: u64,
    /// `close` calls, including repeated and failed ones.
    pub close_calls: u64,
    /// Scanners that closed successfully.
    pub cursors_closed: u64,
    /// Pages served.
    pub pages_fetched: u64,
    /// Alter requests applied.
    pub alters: u64,
}

impl ProbeSnapshot {
    /// Returns the number of scanners opened but never closed.
    pub fn open_cursors(&self) -> u64 {
        self.cursors_opened.saturating_sub(self.cursors_closed)
    }
}

/// Open handle to a memory table.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryTable {
    name: String,
    schema: Schema,
}

impl TableHandle for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[derive(Debug, Clone)]
struct TableData {
    schema: Schema,
    rows: Rows,
}

impl TableData {
    fn handle(&self, name: &str) -> MemoryTable {
        MemoryTable {
            name: name.to_string(),
            schema: self.schema.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: RwLock<HashMap<String, TableData>>,
    faults: RwLock<FaultPlan>,
    probe: Arc<Probe>,
}

/// Table store held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Tables and rows
    // =========================================================================

    /// Creates a table.
    pub fn create_table(&self, name: &str, schema: Schema) -> StoreResult<MemoryTable> {
        let mut tables = self.inner.tables.write();
        if tables.contains_key(name) {
            return Err(StoreError::TableExists(name.to_string()));
        }
        let names = schema.names();
        for (i, column) in names.iter().enumerate() {
            if names[..i].contains(column) {
                return Err(StoreError::ColumnExists(column.to_string()));
            }
        }
        let data = TableData {
            schema,
            rows: Arc::new(Vec::new()),
        };
        let handle = data.handle(name);
        tables.insert(name.to_string(), data);
        debug!(table = %name, columns = handle.schema.len(), "created memory table");
        Ok(handle)
    }

    /// Drops a table.
    pub fn drop_table(&self, name: &str) -> StoreResult<()> {
        self.inner
            .tables
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::TableMissing(name.to_string()))
    }

    /// Returns a handle without counting a lookup.
    pub fn table(&self, name: &str) -> StoreResult<MemoryTable> {
        self.inner
            .tables
            .read()
            .get(name)
            .map(|data| data.handle(name))
            .ok_or_else(|| StoreError::TableMissing(name.to_string()))
    }

    /// Returns the table names in sorted order.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of rows in a table.
    pub fn row_count(&self, name: &str) -> StoreResult<usize> {
        self.inner
            .tables
            .read()
            .get(name)
            .map(|data| data.rows.len())
            .ok_or_else(|| StoreError::TableMissing(name.to_string()))
    }

    /// Appends one row of cells, in schema order.
    pub fn insert(&self, name: &str, cells: Vec<Cell>) -> StoreResult<()> {
        let mut tables = self.inner.tables.write();
        let data = tables
            .get_mut(name)
            .ok_or_else(|| StoreError::TableMissing(name.to_string()))?;
        check_row(&data.schema, &cells)?;
        Arc::make_mut(&mut data.rows).push(cells);
        Ok(())
    }

    /// Appends one row of values, in schema order.
    pub fn insert_values(&self, name: &str, values: Vec<Value>) -> StoreResult<()> {
        self.insert(name, values.into_iter().map(Cell::from).collect())
    }

    // =========================================================================
    // Faults and counters
    // =========================================================================

    /// Replaces the injected faults. Open cursors keep the plan they started with.
    pub fn set_faults(&self, faults: FaultPlan) {
        *self.inner.faults.write() = faults;
    }

    /// Removes every injected fault.
    pub fn clear_faults(&self) {
        self.set_faults(FaultPlan::default());
    }

    /// Returns the current call counters.
    pub fn probe(&self) -> ProbeSnapshot {
        self.inner.probe.snapshot()
    }

    fn faults(&self) -> FaultPlan {
        self.inner.faults.read().clone()
    }

    fn check_reachable(&self, faults: &FaultPlan) -> StoreResult<()> {
        if faults.unreachable {
            return Err(StoreError::Unreachable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

impl TableStore for MemoryStore {
    type Table = MemoryTable;
    type Cursor = MemoryCursor;

    fn open_table(&self, name: &str) -> StoreResult<MemoryTable> {
        Probe::bump(&self.inner.probe.table_lookups);
        self.check_reachable(&self.faults())?;
        self.table(name)
    }

    fn new_scanner(&self, table: &MemoryTable, options: ScanOptions) -> StoreResult<MemoryCursor> {
        let faults = self.faults();
        self.check_reachable(&faults)?;
        if faults.fail_scanner {
            return Err(StoreError::Rpc(format!(
                "no tablet server accepted a scanner for '{}'",
                table.name
            )));
        }

        let (schema, rows) = {
            let tables = self.inner.tables.read();
            let data = tables
                .get(&table.name)
                .ok_or_else(|| StoreError::TableMissing(table.name.clone()))?;
            (Arc::new(data.schema.clone()), Arc::clone(&data.rows))
        };
        Probe::bump(&self.inner.probe.cursors_opened);

        Ok(MemoryCursor::new(
            schema,
            rows,
            options.batch_size_rows,
            faults,
            Arc::clone(&self.inner.probe),
        ))
    }

    fn alter_table(&self, name: &str, options: &AlterTableOptions) -> StoreResult<()> {
        let faults = self.faults();
        self.check_reachable(&faults)?;
        if faults.fail_alter {
            return Err(StoreError::Rpc(format!("alter of '{}' was rejected", name)));
        }

        let mut tables = self.inner.tables.write();
        let current = tables
            .get(name)
            .ok_or_else(|| StoreError::TableMissing(name.to_string()))?;

        // Steps apply to a copy so a failing step leaves the table untouched.
        let mut schema = current.schema.clone();
        let mut rows: Vec<Vec<Cell>> = current.rows.as_ref().clone();
        for step in options.steps() {
            match step {
                AlterStep::AddColumn { column, default } => {
                    let fill = added_cell(&schema, column, default.as_ref())?;
                    for row in rows.iter_mut() {
                        row.push(fill.clone());
                    }
                    schema = schema.with_column(column.clone());
                }
                AlterStep::DropColumn(column) => {
                    let index = schema
                        .index_of(column)
                        .ok_or_else(|| StoreError::ColumnMissing(column.clone()))?;
                    for row in rows.iter_mut() {
                        row.remove(index);
                    }
                    schema = schema.without_column(column);
                }
            }
        }

        tables.insert(
            name.to_string(),
            TableData {
                schema,
                rows: Arc::new(rows),
            },
        );
        Probe::bump(&self.inner.probe.alters);
        Ok(())
    }
}

/// Validates a row against a schema.
fn check_row(schema: &Schema, cells: &[Cell]) -> StoreResult<()> {
    if cells.len() != schema.len() {
        return Err(StoreError::SchemaMismatch(format!(
            "expected {} cells, got {}",
            schema.len(),
            cells.len()
        )));
    }
    for (column, cell) in schema.iter().zip(cells) {
        if cell.is_null() && !column.is_nullable() {
            return Err(StoreError::SchemaMismatch(format!(
                "column '{}' is not nullable",
                column.name()
            )));
        }
        if !cell.fits(column.column_type()) {
            return Err(StoreError::SchemaMismatch(format!(
                "column '{}' is {}, got a {} cell",
                column.name(),
                column.column_type(),
                cell.kind()
            )));
        }
    }
    Ok(())
}

/// Cell that existing rows take for a newly added column.
fn added_cell(
    schema: &Schema,
    column: &ColumnDescriptor,
    default: Option<&Value>,
) -> StoreResult<Cell> {
    if schema.column(column.name()).is_some() {
        return Err(StoreError::ColumnExists(column.name().to_string()));
    }
    let fill = default.cloned().map(Cell::from).unwrap_or(Cell::Null);
    if fill.is_null() && !column.is_nullable() {
        return Err(StoreError::SchemaMismatch(format!(
            "non-nullable column '{}' needs a default",
            column.name()
        )));
    }
    if !fill.fits(column.column_type()) {
        return Err(StoreError::SchemaMismatch(format!(
            "default for column '{}' is not a {} value",
            column.name(),
            column.column_type()
        )));
    }
    Ok(fill)
}
