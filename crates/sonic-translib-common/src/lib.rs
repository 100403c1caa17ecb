//! Common infrastructure for SONiC translib applications.
//!
//! A translib application turns path-addressed management requests into
//! CONFIG_DB reads and writes. This crate holds everything an application
//! needs that is not specific to one table family:
//!
//! - [`db`]: CONFIG_DB key/value model and the [`ConfigDb`] store trait
//! - [`MemoryDb`]: ordered in-process store with failure injection
//! - [`RedisDb`]: Redis-backed store
//! - [`path`]: path template matching (`/vlan/{id}` against `/vlan/10`)
//! - [`app`]: request/response types and the [`AppHandler`] trait
//! - [`error`]: error types for store and request processing
//!
//! # Example
//!
//! ```ignore
//! use sonic_translib_common::{AppHandler, AppRequest, MemoryDb, OpKind};
//!
//! let db = MemoryDb::new();
//! let request = AppRequest::new("/vlan", OpKind::Create, b"[10, 20]".to_vec());
//! let response = vlan_app.process(&db, &request).await?;
//! ```

pub mod app;
pub mod db;
pub mod error;
pub mod memory_db;
pub mod path;
pub mod redis_db;

// Re-export commonly used items at crate root
pub use app::{AppHandler, AppRequest, AppResponse, OpKind};
pub use db::{ConfigDb, Key, TableSpec, Value};
pub use error::{DbError, DbResult, ErrorKind, TranslibError, TranslibResult};
pub use memory_db::{DbOp, JournalEntry, MemoryDb};
pub use path::PathInfo;
pub use redis_db::{RedisConfig, RedisDb};
