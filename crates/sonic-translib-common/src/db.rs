//! CONFIG_DB key/value model and the store trait.
//!
//! CONFIG_DB rows are Redis hashes named `TABLE|key1|key2`. A row's fields
//! are plain strings; list-valued fields carry an `@` suffix on the field
//! name and hold comma-separated items (`members@ = "Ethernet0,Ethernet4"`).

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DbResult;

/// Separator between the table name and key components.
pub const KEY_SEPARATOR: char = '|';

/// Placeholder field written for rows that have no fields of their own.
pub const NULL_FIELD: &str = "NULL";

/// Suffix marking a list-valued field.
pub const LIST_SUFFIX: char = '@';

/// Separator between items of a list-valued field.
pub const LIST_SEPARATOR: char = ',';

/// Identifies a CONFIG_DB table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableSpec {
    /// Table name (e.g., "VLAN").
    pub name: &'static str,
}

impl TableSpec {
    /// Creates a table spec.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

/// Key of a row within a table, made of one or more components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    /// Key components in order (e.g., `["Vlan10", "Ethernet0"]`).
    pub comps: Vec<String>,
}

impl Key {
    /// Creates a single-component key.
    pub fn new(comp: impl Into<String>) -> Self {
        Self {
            comps: vec![comp.into()],
        }
    }

    /// Creates a multi-component key.
    pub fn from_comps<I, S>(comps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            comps: comps.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses the key part of a Redis hash name (everything after `TABLE|`).
    pub fn parse(joined: &str) -> Self {
        Self::from_comps(joined.split(KEY_SEPARATOR))
    }

    /// Returns the component at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.comps.get(index).map(String::as_str)
    }

    /// Returns the number of components.
    pub fn len(&self) -> usize {
        self.comps.len()
    }

    /// Returns true if the key has no components.
    pub fn is_empty(&self) -> bool {
        self.comps.is_empty()
    }

    /// Returns the Redis hash name for this key in `table`.
    pub fn redis_key(&self, table: &TableSpec) -> String {
        format!("{}{}{}", table.name, KEY_SEPARATOR, self)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, comp) in self.comps.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", KEY_SEPARATOR)?;
            }
            f.write_str(comp)?;
        }
        Ok(())
    }
}

/// Field-value contents of a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    /// Fields by name, list fields including their `@` suffix.
    pub field: BTreeMap<String, String>,
}

impl Value {
    /// Creates an empty value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a value from field-value pairs, dropping the NULL placeholder.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let field = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k != NULL_FIELD)
            .collect();
        Self { field }
    }

    /// Returns true if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }

    /// Gets a scalar field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.field.get(name).map(String::as_str)
    }

    /// Sets a scalar field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.field.insert(name.into(), value.into());
    }

    /// Removes a field, scalar or list.
    pub fn remove(&mut self, name: &str) {
        self.field.remove(name);
        self.field.remove(&list_field_name(name));
    }

    /// Gets a list field by its bare name (without `@`).
    ///
    /// Returns an empty list when the field is absent.
    pub fn get_list(&self, name: &str) -> Vec<String> {
        match self.field.get(&list_field_name(name)) {
            Some(joined) if !joined.is_empty() => joined
                .split(LIST_SEPARATOR)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Sets a list field by its bare name. An empty list removes the field.
    pub fn set_list<S: AsRef<str>>(&mut self, name: &str, items: &[S]) {
        let field = list_field_name(name);
        if items.is_empty() {
            self.field.remove(&field);
            return;
        }
        let joined = items
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(&LIST_SEPARATOR.to_string());
        self.field.insert(field, joined);
    }

    /// Returns field-value pairs as written to Redis.
    ///
    /// An empty row is written as the `NULL`/`NULL` placeholder.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        if self.field.is_empty() {
            return vec![(NULL_FIELD.to_string(), NULL_FIELD.to_string())];
        }
        self.field
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn list_field_name(name: &str) -> String {
    format!("{}{}", name, LIST_SUFFIX)
}

/// Single-entry access to CONFIG_DB.
///
/// The store offers no multi-key transactions. Callers that keep several
/// rows consistent must order their writes themselves.
///
/// # Errors
///
/// - `get_entry` returns [`DbError::NotFound`](crate::DbError::NotFound) for
///   an absent row.
/// - `create_entry` returns
///   [`DbError::AlreadyExists`](crate::DbError::AlreadyExists) if the row is
///   present.
/// - `delete_entry` of an absent row succeeds.
#[async_trait]
pub trait ConfigDb: Send + Sync {
    /// Reads one row.
    async fn get_entry(&self, table: &TableSpec, key: &Key) -> DbResult<Value>;

    /// Lists the keys of every row in a table, in backend enumeration order.
    async fn get_keys(&self, table: &TableSpec) -> DbResult<Vec<Key>>;

    /// Creates a row that must not exist yet.
    async fn create_entry(&self, table: &TableSpec, key: &Key, value: &Value) -> DbResult<()>;

    /// Writes a row, replacing all of its fields (upsert).
    async fn set_entry(&self, table: &TableSpec, key: &Key, value: &Value) -> DbResult<()>;

    /// Deletes a row.
    async fn delete_entry(&self, table: &TableSpec, key: &Key) -> DbResult<()>;

    /// Returns true if the row exists.
    async fn exists_entry(&self, table: &TableSpec, key: &Key) -> DbResult<bool> {
        match self.get_entry(table, key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
