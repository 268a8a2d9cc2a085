//! Paged scans over a memory table.

use std::sync::Arc;

use tabula_common::{ColumnType, Schema, StoreError, StoreResult};

use super::cell::Cell;
use super::{FaultPlan, Probe};
use crate::store::{RawRow, RowPage, ScanCursor};

pub(super) type Rows = Arc<Vec<Vec<Cell>>>;

/// Scanner over a snapshot of one table.
///
/// Rows inserted after the scanner was opened are not seen.
#[derive(Debug)]
pub struct MemoryCursor {
    schema: Arc<Schema>,
    rows: Rows,
    batch_size: usize,
    position: usize,
    pages: usize,
    closed: bool,
    faults: FaultPlan,
    probe: Arc<Probe>,
}

impl MemoryCursor {
    pub(super) fn new(
        schema: Arc<Schema>,
        rows: Rows,
        batch_size: usize,
        faults: FaultPlan,
        probe: Arc<Probe>,
    ) -> Self {
        Self {
            schema,
            rows,
            batch_size: batch_size.max(1),
            position: 0,
            pages: 0,
            closed: false,
            faults,
            probe,
        }
    }

    /// Returns true once the cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ScanCursor for MemoryCursor {
    type Page = MemoryPage;

    fn has_more_rows(&self) -> bool {
        !self.closed && self.position < self.rows.len()
    }

    fn next_rows(&mut self) -> StoreResult<MemoryPage> {
        if self.closed {
            return Err(StoreError::ScannerClosed);
        }
        if self.faults.fail_page == Some(self.pages) {
            return Err(StoreError::Rpc(format!(
                "tablet server dropped the scan at page {}",
                self.pages
            )));
        }

        let start = self.position;
        let end = (start + self.batch_size).min(self.rows.len());
        self.position = end;
        self.pages += 1;
        self.probe.page_fetched();

        Ok(MemoryPage {
            schema: Arc::clone(&self.schema),
            rows: Arc::clone(&self.rows),
            start,
            end,
        })
    }

    fn close(&mut self) -> StoreResult<()> {
        self.probe.close_called();
        if self.closed {
            return Ok(());
        }
        if self.faults.fail_close {
            return Err(StoreError::Rpc("scanner close was not acknowledged".into()));
        }
        self.closed = true;
        self.probe.cursor_closed();
        Ok(())
    }
}

/// One fetched page.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    schema: Arc<Schema>,
    rows: Rows,
    start: usize,
    end: usize,
}

impl RowPage for MemoryPage {
    type Row<'a> = MemoryRow<'a>
    where
        Self: 'a;

    fn num_rows(&self) -> usize {
        self.end - self.start
    }

    fn row(&self, index: usize) -> MemoryRow<'_> {
        MemoryRow {
            schema: &self.schema,
            cells: &self.rows[self.start + index],
        }
    }
}

/// A row view borrowing its page.
#[derive(Debug, Clone, Copy)]
pub struct MemoryRow<'a> {
    schema: &'a Schema,
    cells: &'a [Cell],
}

impl<'a> MemoryRow<'a> {
    fn position(&self, column: &str) -> StoreResult<usize> {
        self.schema
            .index_of(column)
            .ok_or_else(|| StoreError::ColumnMissing(column.to_string()))
    }

    /// Finds a non-null cell, checking the declared type against `requested`.
    fn typed(&self, column: &str, requested: ColumnType) -> StoreResult<&'a Cell> {
        let index = self.position(column)?;
        let actual = self.schema.columns()[index].column_type();
        let compatible = actual == requested
            || (requested == ColumnType::Int64 && actual == ColumnType::UnixtimeMicros);
        if !compatible {
            return Err(StoreError::TypeMismatch {
                column: column.to_string(),
                requested,
                actual,
            });
        }
        match &self.cells[index] {
            Cell::Null => Err(StoreError::NullCell(column.to_string())),
            cell => Ok(cell),
        }
    }
}

fn corrupt(column: &str, cell: &Cell) -> StoreError {
    StoreError::SchemaMismatch(format!(
        "column '{}' holds a {} cell",
        column,
        cell.kind()
    ))
}

impl<'a> RawRow for MemoryRow<'a> {
    fn is_null(&self, column: &str) -> StoreResult<bool> {
        let index = self.position(column)?;
        Ok(self.cells[index].is_null())
    }

    fn get_i8(&self, column: &str) -> StoreResult<i8> {
        match self.typed(column, ColumnType::Int8)? {
            Cell::Int8(v) => Ok(*v),
            other => Err(corrupt(column, other)),
        }
    }

    fn get_i16(&self, column: &str) -> StoreResult<i16> {
        match self.typed(column, ColumnType::Int16)? {
            Cell::Int16(v) => Ok(*v),
            other => Err(corrupt(column, other)),
        }
    }

    fn get_i32(&self, column: &str) -> StoreResult<i32> {
        match self.typed(column, ColumnType::Int32)? {
            Cell::Int32(v) => Ok(*v),
            other => Err(corrupt(column, other)),
        }
    }

    fn get_i64(&self, column: &str) -> StoreResult<i64> {
        match self.typed(column, ColumnType::Int64)? {
            Cell::Int64(v) => Ok(*v),
            other => Err(corrupt(column, other)),
        }
    }

    fn get_binary(&self, column: &str) -> StoreResult<&[u8]> {
        match self.typed(column, ColumnType::Binary)? {
            Cell::Binary(v) => Ok(v.as_ref()),
            other => Err(corrupt(column, other)),
        }
    }

    fn get_string(&self, column: &str) -> StoreResult<&str> {
        match self.typed(column, ColumnType::String)? {
            Cell::String(v) => Ok(v.as_str()),
            other => Err(corrupt(column, other)),
        }
    }

    fn get_bool(&self, column: &str) -> StoreResult<bool> {
        match self.typed(column, ColumnType::Bool)? {
            Cell::Bool(v) => Ok(*v),
            other => Err(corrupt(column, other)),
        }
    }

    fn get_f32(&self, column: &str) -> StoreResult<f32> {
        match self.typed(column, ColumnType::Float)? {
            Cell::Float(v) => Ok(*v),
            other => Err(corrupt(column, other)),
        }
    }

    fn get_f64(&self, column: &str) -> StoreResult<f64> {
        match self.typed(column, ColumnType::Double)? {
            Cell::Double(v) => Ok(*v),
            other => Err(corrupt(column, other)),
        }
    }
}
