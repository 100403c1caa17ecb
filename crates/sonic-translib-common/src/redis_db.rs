//! Redis-backed CONFIG_DB store.
//!
//! Rows are Redis hashes named `TABLE|key`. Table enumeration uses `KEYS`,
//! which CONFIG_DB sizes tolerate. `create_entry` is an `EXISTS` check
//! followed by the write, so two concurrent creators of the same key can
//! both succeed; single-writer deployments never observe this.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::db::{ConfigDb, Key, TableSpec, Value, KEY_SEPARATOR};
use crate::error::{DbError, DbResult};

/// CONFIG_DB database index.
pub const CONFIG_DB_NUMBER: u32 = 4;

/// Connection parameters for a Redis database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Redis server hostname or IP
    pub host: String,
    /// Redis server port
    pub port: u16,
    /// Database index
    pub db_number: u32,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl RedisConfig {
    /// Creates a new Redis configuration.
    pub fn new(host: impl Into<String>, port: u16, db_number: u32) -> Self {
        Self {
            host: host.into(),
            port,
            db_number,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Creates CONFIG_DB connection config.
    pub fn config_db(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, CONFIG_DB_NUMBER)
    }

    /// Overrides the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the Redis connection URI.
    pub fn uri(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db_number)
    }
}

/// [`ConfigDb`] implementation over a Redis connection manager.
#[derive(Clone)]
pub struct RedisDb {
    config: RedisConfig,
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDb")
            .field("config", &self.config)
            .finish()
    }
}

impl RedisDb {
    /// Connects to Redis.
    pub async fn connect(config: RedisConfig) -> DbResult<Self> {
        let uri = config.uri();

        let client = redis::Client::open(uri.clone())
            .map_err(|e| DbError::backend("connect", format!("{}: {}", uri, e)))?;

        let connection = tokio::time::timeout(config.connect_timeout, client.get_connection_manager())
            .await
            .map_err(|_| DbError::backend("connect", format!("{}: timed out", uri)))?
            .map_err(|e| DbError::backend("connect", format!("{}: {}", uri, e)))?;

        info!("Connected to Redis: {} (db={})", config.host, config.db_number);

        Ok(Self { config, connection })
    }

    /// Returns the connection configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

/// Strips `TABLE|` from a Redis hash name, returning the key part.
fn strip_table<'a>(table: &TableSpec, redis_key: &'a str) -> Option<&'a str> {
    redis_key
        .strip_prefix(table.name)?
        .strip_prefix(KEY_SEPARATOR)
}

fn command_error(operation: &str, e: redis::RedisError) -> DbError {
    DbError::backend(operation, e.to_string())
}

#[async_trait]
impl ConfigDb for RedisDb {
    async fn get_entry(&self, table: &TableSpec, key: &Key) -> DbResult<Value> {
        let redis_key = key.redis_key(table);
        let mut conn = self.connection.clone();

        let fvs: HashMap<String, String> = conn
            .hgetall(&redis_key)
            .await
            .map_err(|e| command_error("hgetall", e))?;

        // HGETALL on a missing hash yields an empty map
        if fvs.is_empty() {
            return Err(DbError::not_found(table.name, key.to_string()));
        }
        Ok(Value::from_pairs(fvs))
    }

    async fn get_keys(&self, table: &TableSpec) -> DbResult<Vec<Key>> {
        let pattern = format!("{}{}*", table.name, KEY_SEPARATOR);
        let mut conn = self.connection.clone();

        let redis_keys: Vec<String> = conn
            .keys(&pattern)
            .await
            .map_err(|e| command_error("keys", e))?;

        let keys: Vec<Key> = redis_keys
            .iter()
            .filter_map(|k| strip_table(table, k))
            .map(Key::parse)
            .collect();

        debug!("Read {} keys from table {}", keys.len(), table.name);
        Ok(keys)
    }

    async fn create_entry(&self, table: &TableSpec, key: &Key, value: &Value) -> DbResult<()> {
        let redis_key = key.redis_key(table);
        let mut conn = self.connection.clone();

        let exists: bool = conn
            .exists(&redis_key)
            .await
            .map_err(|e| command_error("exists", e))?;
        if exists {
            return Err(DbError::already_exists(table.name, key.to_string()));
        }

        let _: () = conn
            .hset_multiple(&redis_key, &value.to_pairs())
            .await
            .map_err(|e| command_error("hset", e))?;
        Ok(())
    }

    async fn set_entry(&self, table: &TableSpec, key: &Key, value: &Value) -> DbResult<()> {
        let redis_key = key.redis_key(table);
        let mut conn = self.connection.clone();

        // Replace the whole hash so removed fields (e.g. an emptied list) vanish
        let _: () = redis::pipe()
            .atomic()
            .del(&redis_key)
            .ignore()
            .hset_multiple(&redis_key, &value.to_pairs())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("hset", e))?;
        Ok(())
    }

    async fn delete_entry(&self, table: &TableSpec, key: &Key) -> DbResult<()> {
        let redis_key = key.redis_key(table);
        let mut conn = self.connection.clone();

        let _: () = conn
            .del(&redis_key)
            .await
            .map_err(|e| command_error("del", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config() {
        let config = RedisConfig::config_db("127.0.0.1", 6379);
        assert_eq!(config.db_number, CONFIG_DB_NUMBER);
        assert_eq!(config.uri(), "redis://127.0.0.1:6379/4");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));

        let config = config.with_connect_timeout(Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_strip_table() {
        let vlan = TableSpec::new("VLAN");
        let member = TableSpec::new("VLAN_MEMBER");

        assert_eq!(strip_table(&vlan, "VLAN|Vlan10"), Some("Vlan10"));
        assert_eq!(
            strip_table(&member, "VLAN_MEMBER|Vlan10|Ethernet0"),
            Some("Vlan10|Ethernet0")
        );
        // Pattern VLAN|* never matches VLAN_MEMBER rows, but guard anyway
        assert_eq!(strip_table(&vlan, "VLAN_MEMBER|Vlan10|Ethernet0"), None);
    }
}
