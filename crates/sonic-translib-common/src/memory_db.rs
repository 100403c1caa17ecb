//! In-memory CONFIG_DB store.
//!
//! Rows are kept per table in a `BTreeMap`, so key enumeration is ordered by
//! key components. Data is lost on drop; use for tests and dry runs.
//!
//! Mutating operations are recorded in a journal, and failures can be
//! injected on a specific (operation, table, key) triple. Together these let
//! tests check the exact write order of multi-row operations and what is left
//! behind when one step fails.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::{ConfigDb, Key, TableSpec, Value};
use crate::error::{DbError, DbResult};

/// Store operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbOp {
    /// `get_entry` (never journaled)
    Get,
    /// `create_entry`
    Create,
    /// `set_entry`
    Set,
    /// `delete_entry`
    Delete,
}

impl DbOp {
    fn as_str(&self) -> &'static str {
        match self {
            DbOp::Get => "get",
            DbOp::Create => "create",
            DbOp::Set => "set",
            DbOp::Delete => "delete",
        }
    }
}

/// One committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Operation kind.
    pub op: DbOp,
    /// Table name.
    pub table: String,
    /// Row key.
    pub key: Key,
}

impl JournalEntry {
    /// Creates a journal entry.
    pub fn new(op: DbOp, table: impl Into<String>, key: Key) -> Self {
        Self {
            op,
            table: table.into(),
            key,
        }
    }
}

#[derive(Default)]
struct Inner {
    tables: BTreeMap<String, BTreeMap<Key, Value>>,
    journal: Vec<JournalEntry>,
    faults: Vec<(DbOp, String, Key)>,
}

impl Inner {
    fn check_fault(&self, op: DbOp, table: &TableSpec, key: &Key) -> DbResult<()> {
        let hit = self
            .faults
            .iter()
            .any(|(o, t, k)| *o == op && t == table.name && k == key);
        if hit {
            return Err(DbError::backend(
                op.as_str(),
                format!("injected failure on {}", key.redis_key(table)),
            ));
        }
        Ok(())
    }

    fn record(&mut self, op: DbOp, table: &TableSpec, key: &Key) {
        self.journal
            .push(JournalEntry::new(op, table.name, key.clone()));
    }
}

/// In-memory implementation of [`ConfigDb`].
#[derive(Default)]
pub struct MemoryDb {
    inner: Mutex<Inner>,
}

impl MemoryDb {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a row directly, bypassing the journal and injected faults.
    ///
    /// Used to seed a store with state (including inconsistent state) that
    /// the public operations would never produce.
    pub fn insert(&self, table: &TableSpec, key: Key, value: Value) {
        self.inner
            .lock()
            .tables
            .entry(table.name.to_string())
            .or_default()
            .insert(key, value);
    }

    /// Returns a copy of a row, if present.
    pub fn entry(&self, table: &TableSpec, key: &Key) -> Option<Value> {
        self.inner
            .lock()
            .tables
            .get(table.name)
            .and_then(|rows| rows.get(key).cloned())
    }

    /// Returns the keys of a table in order.
    pub fn keys(&self, table: &TableSpec) -> Vec<Key> {
        self.inner
            .lock()
            .tables
            .get(table.name)
            .map(|rows| rows.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the total number of rows across all tables.
    pub fn len(&self) -> usize {
        self.inner.lock().tables.values().map(BTreeMap::len).sum()
    }

    /// Returns true if no table holds any row.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes every future `op` on `table`/`key` fail with a backend error.
    ///
    /// The failing call leaves the store untouched.
    pub fn fail_on(&self, op: DbOp, table: &TableSpec, key: Key) {
        self.inner
            .lock()
            .faults
            .push((op, table.name.to_string(), key));
    }

    /// Removes all injected failures.
    pub fn clear_faults(&self) {
        self.inner.lock().faults.clear();
    }

    /// Returns the committed mutations in order.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.inner.lock().journal.clone()
    }

    /// Forgets recorded mutations.
    pub fn clear_journal(&self) {
        self.inner.lock().journal.clear();
    }
}

#[async_trait]
impl ConfigDb for MemoryDb {
    async fn get_entry(&self, table: &TableSpec, key: &Key) -> DbResult<Value> {
        let inner = self.inner.lock();
        inner.check_fault(DbOp::Get, table, key)?;

        inner
            .tables
            .get(table.name)
            .and_then(|rows| rows.get(key).cloned())
            .ok_or_else(|| DbError::not_found(table.name, key.to_string()))
    }

    async fn get_keys(&self, table: &TableSpec) -> DbResult<Vec<Key>> {
        Ok(self.keys(table))
    }

    async fn create_entry(&self, table: &TableSpec, key: &Key, value: &Value) -> DbResult<()> {
        let mut inner = self.inner.lock();
        inner.check_fault(DbOp::Create, table, key)?;

        let rows = inner.tables.entry(table.name.to_string()).or_default();
        if rows.contains_key(key) {
            return Err(DbError::already_exists(table.name, key.to_string()));
        }
        rows.insert(key.clone(), value.clone());
        inner.record(DbOp::Create, table, key);

        debug!("create {}", key.redis_key(table));
        Ok(())
    }

    async fn set_entry(&self, table: &TableSpec, key: &Key, value: &Value) -> DbResult<()> {
        let mut inner = self.inner.lock();
        inner.check_fault(DbOp::Set, table, key)?;

        inner
            .tables
            .entry(table.name.to_string())
            .or_default()
            .insert(key.clone(), value.clone());
        inner.record(DbOp::Set, table, key);

        debug!("set {}", key.redis_key(table));
        Ok(())
    }

    async fn delete_entry(&self, table: &TableSpec, key: &Key) -> DbResult<()> {
        let mut inner = self.inner.lock();
        inner.check_fault(DbOp::Delete, table, key)?;

        if let Some(rows) = inner.tables.get_mut(table.name) {
            rows.remove(key);
        }
        inner.record(DbOp::Delete, table, key);

        debug!("delete {}", key.redis_key(table));
        Ok(())
    }
}
