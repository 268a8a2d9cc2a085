//! The table store contract.
//!
//! A store client implements these traits; everything else in this crate is
//! written against them. The shapes follow a paged scanner API:
//!
//! ```text
//! TableStore ──open_table──▶ TableHandle (name + schema)
//!     │
//!     └──new_scanner──▶ ScanCursor ──next_rows──▶ RowPage ──row(i)──▶ RawRow
//! ```
//!
//! A `RawRow` borrows its page, so values read from it cannot outlive the
//! page; projection copies every value out before moving on.

mod alter;

use std::time::Duration;

use tabula_common::{ClientConfig, Schema, StoreResult};

pub use alter::{AlterStep, AlterTableOptions};

/// Scanner construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Rows per page requested from the store.
    pub batch_size_rows: usize,
    /// Read timeout for each page fetch.
    pub read_timeout: Duration,
}

impl ScanOptions {
    /// Derives scan options from client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            batch_size_rows: config.scan_batch_size_rows,
            read_timeout: config.socket_read_timeout(),
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// A connected table store client.
pub trait TableStore {
    /// Open table handle.
    type Table: TableHandle + Clone;
    /// Paged scanner.
    type Cursor: ScanCursor;

    /// Opens a table by name. Fails with `TableMissing` if it does not exist.
    fn open_table(&self, name: &str) -> StoreResult<Self::Table>;

    /// Opens a full-table scanner over every column and row.
    fn new_scanner(&self, table: &Self::Table, options: ScanOptions) -> StoreResult<Self::Cursor>;

    /// Applies a schema change to the named table.
    fn alter_table(&self, name: &str, options: &AlterTableOptions) -> StoreResult<()>;
}

/// An open table.
pub trait TableHandle {
    /// Table name.
    fn name(&self) -> &str;

    /// Schema captured when the table was opened.
    fn schema(&self) -> &Schema;
}

/// A server-side paged scan.
pub trait ScanCursor {
    /// One page of rows.
    type Page: RowPage;

    /// Returns true while the scan may produce more pages.
    fn has_more_rows(&self) -> bool;

    /// Fetches the next page.
    fn next_rows(&mut self) -> StoreResult<Self::Page>;

    /// Releases the scan. Calling it again after success is a no-op.
    fn close(&mut self) -> StoreResult<()>;
}

/// A fetched batch of rows.
pub trait RowPage {
    /// Row view borrowing this page.
    type Row<'a>: RawRow
    where
        Self: 'a;

    /// Number of rows in the page.
    fn num_rows(&self) -> usize;

    /// Returns the row at `index`. `index` must be below `num_rows()`.
    fn row(&self, index: usize) -> Self::Row<'_>;

    /// Iterates over the rows in page order.
    fn rows(&self) -> PageRows<'_, Self>
    where
        Self: Sized,
    {
        PageRows {
            page: self,
            next: 0,
        }
    }

    /// Returns true if the page holds no rows.
    fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }
}

/// Iterator over the rows of a page.
pub struct PageRows<'p, P> {
    page: &'p P,
    next: usize,
}

impl<'p, P> Iterator for PageRows<'p, P>
where
    P: RowPage + 'p,
{
    type Item = P::Row<'p>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.page.num_rows() {
            return None;
        }
        let row = self.page.row(self.next);
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.page.num_rows().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Typed getters over one row, keyed by column name.
///
/// Getters fail with `ColumnMissing`, `TypeMismatch`, or `NullCell`.
pub trait RawRow {
    /// Returns true if the cell is null.
    fn is_null(&self, column: &str) -> StoreResult<bool>;

    /// Reads an `INT8` cell.
    fn get_i8(&self, column: &str) -> StoreResult<i8>;

    /// Reads an `INT16` cell.
    fn get_i16(&self, column: &str) -> StoreResult<i16>;

    /// Reads an `INT32` cell.
    fn get_i32(&self, column: &str) -> StoreResult<i32>;

    /// Reads an `INT64` or `UNIXTIME_MICROS` cell.
    fn get_i64(&self, column: &str) -> StoreResult<i64>;

    /// Reads a `BINARY` cell.
    fn get_binary(&self, column: &str) -> StoreResult<&[u8]>;

    /// Reads a `STRING` cell.
    fn get_string(&self, column: &str) -> StoreResult<&str>;

    /// Reads a `BOOL` cell.
    fn get_bool(&self, column: &str) -> StoreResult<bool>;

    /// Reads a `FLOAT` cell.
    fn get_f32(&self, column: &str) -> StoreResult<f32>;

    /// Reads a `DOUBLE` cell.
    fn get_f64(&self, column: &str) -> StoreResult<f64>;
}
