//! Row projection.
//!
//! Drives one paged scan per call and turns every raw row into a [`Record`].
//! The cursor is held by a guard that closes it exactly once, whether the
//! scan finishes, stops at its limit, or fails. A failing close is logged
//! and never replaces the scan's own outcome.

use std::fmt;

use tracing::{debug, warn};

use tabula_common::{Record, TabulaError, TabulaResult};

use crate::dispatch::AccessPlan;
use crate::store::{RowPage, ScanCursor, ScanOptions, TableHandle, TableStore};

/// Row cap for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanLimit {
    /// Scan to completion.
    #[default]
    Unbounded,
    /// Return at most this many rows.
    Rows(usize),
}

impl ScanLimit {
    /// Returns true once `emitted` rows satisfy the limit.
    pub fn is_reached(&self, emitted: usize) -> bool {
        match self {
            ScanLimit::Unbounded => false,
            ScanLimit::Rows(limit) => emitted >= *limit,
        }
    }

    /// Returns the row cap, if any.
    pub fn rows(&self) -> Option<usize> {
        match self {
            ScanLimit::Unbounded => None,
            ScanLimit::Rows(limit) => Some(*limit),
        }
    }
}

/// Negative limits mean unbounded.
impl From<i64> for ScanLimit {
    fn from(limit: i64) -> Self {
        usize::try_from(limit).map_or(ScanLimit::Unbounded, ScanLimit::Rows)
    }
}

impl From<Option<usize>> for ScanLimit {
    fn from(limit: Option<usize>) -> Self {
        limit.map_or(ScanLimit::Unbounded, ScanLimit::Rows)
    }
}

impl fmt::Display for ScanLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanLimit::Unbounded => write!(f, "unbounded"),
            ScanLimit::Rows(limit) => write!(f, "{}", limit),
        }
    }
}

/// What one scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Records returned.
    pub rows: usize,
    /// Pages fetched from the store.
    pub pages: usize,
    /// True if the limit stopped the scan before the cursor ran dry.
    pub truncated: bool,
}

/// Records of one scan plus its summary.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Records in storage order.
    pub records: Vec<Record>,
    /// Scan summary.
    pub summary: ScanSummary,
}

/// Closes the wrapped cursor exactly once when dropped.
struct CursorGuard<'t, C: ScanCursor> {
    cursor: C,
    table: &'t str,
}

impl<'t, C: ScanCursor> CursorGuard<'t, C> {
    fn new(cursor: C, table: &'t str) -> Self {
        Self { cursor, table }
    }
}

impl<'t, C: ScanCursor> Drop for CursorGuard<'t, C> {
    fn drop(&mut self) {
        match self.cursor.close() {
            Ok(()) => debug!(table = %self.table, "scanner closed"),
            Err(e) => warn!(table = %self.table, error = %e, "failed to close scanner"),
        }
    }
}

/// Projects the rows of a table into records.
pub struct RowProjector<'s, S> {
    store: &'s S,
    options: ScanOptions,
}

impl<'s, S: TableStore> RowProjector<'s, S> {
    /// Creates a projector over a store.
    pub fn new(store: &'s S, options: ScanOptions) -> Self {
        Self { store, options }
    }

    /// Scans an open table, returning at most `limit` records.
    ///
    /// Fails without partial results: any error discards the records
    /// gathered so far.
    pub fn scan(&self, table: &S::Table, limit: ScanLimit) -> TabulaResult<Projection> {
        let name = table.name();
        let cursor = self
            .store
            .new_scanner(table, self.options)
            .map_err(|e| TabulaError::scan(name, e))?;
        let mut guard = CursorGuard::new(cursor, name);
        debug!(table = %name, %limit, batch = self.options.batch_size_rows, "scanner opened");

        let plan = AccessPlan::for_schema(table.schema())?;
        let projection = drain(&mut guard.cursor, name, &plan, limit)?;

        debug!(
            table = %name,
            rows = projection.summary.rows,
            pages = projection.summary.pages,
            truncated = projection.summary.truncated,
            "scan finished"
        );
        Ok(projection)
    }
}

/// Pulls pages until the cursor is exhausted or the limit is met.
fn drain<C: ScanCursor>(
    cursor: &mut C,
    table: &str,
    plan: &AccessPlan,
    limit: ScanLimit,
) -> TabulaResult<Projection> {
    let mut records = Vec::new();
    let mut summary = ScanSummary::default();

    'pages: while cursor.has_more_rows() {
        // A met limit never pays for another page.
        if limit.is_reached(records.len()) {
            summary.truncated = true;
            break;
        }

        let page = cursor
            .next_rows()
            .map_err(|e| TabulaError::scan(table, e))?;
        summary.pages += 1;

        for row in page.rows() {
            if limit.is_reached(records.len()) {
                summary.truncated = true;
                break 'pages;
            }
            records.push(plan.project(&row)?);
        }
    }

    summary.rows = records.len();
    Ok(Projection { records, summary })
}
