//! Table name constants for vlanapp

use sonic_translib_common::TableSpec;

/// CONFIG_DB VLAN table name
pub const CFG_VLAN_TABLE_NAME: &str = "VLAN";

/// CONFIG_DB VLAN_MEMBER table name
pub const CFG_VLAN_MEMBER_TABLE_NAME: &str = "VLAN_MEMBER";

/// CONFIG_DB VLAN table
pub const VLAN_TABLE: TableSpec = TableSpec::new(CFG_VLAN_TABLE_NAME);

/// CONFIG_DB VLAN_MEMBER table
pub const VLAN_MEMBER_TABLE: TableSpec = TableSpec::new(CFG_VLAN_MEMBER_TABLE_NAME);

/// Field names
pub mod fields {
    /// VLAN ID field
    pub const VLAN_ID: &str = "vlanid";

    /// Member port list (stored as `members@`)
    pub const MEMBERS: &str = "members";

    /// Tagging mode field
    pub const TAGGING_MODE: &str = "tagging_mode";
}
