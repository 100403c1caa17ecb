//! Configuration file support for vlanapp
//!
//! Loads vlanapp configuration from TOML files.
//! Default location: /etc/sonic/vlanapp.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use sonic_translib_common::RedisConfig;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/vlanapp.toml";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// The file path
        path: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid TOML for this schema
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// The file path
        path: String,
        /// Parser message
        message: String,
    },

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Redis host
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Redis port
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Redis database number for CONFIG_DB
    #[serde(default = "default_config_db_number")]
    pub config_db_number: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (e.g., "info", "sonic_vlan_app=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Complete vlanapp configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanAppConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_config_db_number() -> u32 {
    4
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            config_db_number: default_config_db_number(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl VlanAppConfig {
    /// Loads configuration from file, falling back to defaults if the file is absent
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let config: Self = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.redis_host.is_empty() {
            return Err(ConfigError::Invalid("redis_host must not be empty".to_string()));
        }
        if self.database.redis_port == 0 {
            return Err(ConfigError::Invalid("redis_port must be > 0".to_string()));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connection_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Get connection timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.database.connection_timeout_secs)
    }

    /// Returns the CONFIG_DB connection parameters
    pub fn redis_config(&self) -> RedisConfig {
        RedisConfig::new(
            self.database.redis_host.clone(),
            self.database.redis_port,
            self.database.config_db_number,
        )
        .with_connect_timeout(self.connection_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = VlanAppConfig::default();
        assert_eq!(config.database.redis_host, "127.0.0.1");
        assert_eq!(config.database.redis_port, 6379);
        assert_eq!(config.database.config_db_number, 4);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = VlanAppConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, VlanAppConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nredis_port = 6380\n\n[logging]\nlevel = \"debug\"").unwrap();

        let config = VlanAppConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.database.redis_port, 6380);
        assert_eq!(config.database.redis_host, "127.0.0.1");
        assert_eq!(config.logging.level, "debug");

        let redis = config.redis_config();
        assert_eq!(redis.uri(), "redis://127.0.0.1:6380/4");
        assert_eq!(redis.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nredis_port = \"six\"").unwrap();
        let err = VlanAppConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nredis_port = 0").unwrap();
        let err = VlanAppConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
