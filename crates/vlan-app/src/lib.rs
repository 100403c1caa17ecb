//! vlanapp - VLAN translib application for SONiC
//!
//! Serves the `/vlan` path family by reading and writing the CONFIG_DB
//! `VLAN` and `VLAN_MEMBER` tables. Each `VLAN` row carries a `members@`
//! list that mirrors the set of `VLAN_MEMBER` rows under it; every write
//! path keeps the two in step using a fixed per-operation write order.

mod app;
mod config;
mod keys;
mod payload;
mod reader;
mod router;
mod tables;
mod types;
mod writer;

pub use app::VlanApp;
pub use config::*;
pub use keys::*;
pub use payload::*;
pub use reader::VlanReader;
pub use router::*;
pub use tables::*;
pub use types::*;
pub use writer::*;
