//! Schema resolution.
//!
//! A schema comes either from an open table handle (a pure read of the
//! metadata captured at open time) or from a table name, which costs one
//! `open_table` round-trip. Name lookups are not cached unless the resolver
//! was built with its cache enabled; the cache keeps opened handles by name
//! until they are invalidated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use tabula_common::{Schema, TabulaError, TabulaResult};

use crate::store::{TableHandle, TableStore};

/// What to resolve: an open handle or a table name.
#[derive(Debug)]
pub enum TableRef<'a, T> {
    /// An already-open table.
    Handle(&'a T),
    /// A table name to look up.
    Name(&'a str),
}

impl<'a, T> Clone for TableRef<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for TableRef<'a, T> {}

impl<'a, T: TableHandle> TableRef<'a, T> {
    /// Returns the table name.
    pub fn name(&self) -> &'a str {
        match *self {
            TableRef::Handle(handle) => handle.name(),
            TableRef::Name(name) => name,
        }
    }
}

/// Resolves table names to open handles and schemas.
pub struct SchemaResolver<T> {
    /// Opened handles by table name, when caching is enabled.
    cache: Option<RwLock<HashMap<String, T>>>,
    /// Remote lookups performed.
    lookups: AtomicU64,
}

impl<T: TableHandle + Clone> SchemaResolver<T> {
    /// Creates a resolver that looks names up on every call.
    pub fn new() -> Self {
        Self {
            cache: None,
            lookups: AtomicU64::new(0),
        }
    }

    /// Creates a resolver that keeps opened handles until invalidated.
    pub fn cached() -> Self {
        Self {
            cache: Some(RwLock::new(HashMap::new())),
            lookups: AtomicU64::new(0),
        }
    }

    /// Returns true if name lookups are cached.
    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// Returns the number of remote lookups performed so far.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Opens a table by name.
    pub fn open<S>(&self, store: &S, name: &str) -> TabulaResult<T>
    where
        S: TableStore<Table = T>,
    {
        if let Some(cache) = &self.cache {
            if let Some(handle) = cache.read().get(name) {
                debug!(table = %name, "table handle served from cache");
                return Ok(handle.clone());
            }
        }

        self.lookups.fetch_add(1, Ordering::Relaxed);
        let handle = store
            .open_table(name)
            .map_err(|e| TabulaError::lookup_failed(name, e))?;
        debug!(table = %name, columns = handle.schema().len(), "opened table");

        if let Some(cache) = &self.cache {
            cache.write().insert(name.to_string(), handle.clone());
        }
        Ok(handle)
    }

    /// Resolves the ordered column descriptors of a table.
    pub fn resolve<S>(&self, store: &S, target: TableRef<'_, T>) -> TabulaResult<Schema>
    where
        S: TableStore<Table = T>,
    {
        match target {
            TableRef::Handle(handle) => Ok(handle.schema().clone()),
            TableRef::Name(name) => Ok(self.open(store, name)?.schema().clone()),
        }
    }

    /// Drops the cached handle for one table.
    pub fn invalidate(&self, name: &str) {
        if let Some(cache) = &self.cache {
            if cache.write().remove(name).is_some() {
                debug!(table = %name, "invalidated cached table handle");
            }
        }
    }

    /// Drops every cached handle.
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}

impl<T: TableHandle + Clone> Default for SchemaResolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SchemaResolver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaResolver")
            .field("caching", &self.cache.is_some())
            .field("lookups", &self.lookups.load(Ordering::Relaxed))
            .finish()
    }
}
