//! CONFIG_DB key construction for VLAN rows

use sonic_translib_common::Key;

use crate::types::VlanId;

/// VLAN name prefix
pub const VLAN_PREFIX: &str = "Vlan";

/// Returns the VLAN name for an ID ("Vlan100").
pub fn vlan_name(id: VlanId) -> String {
    format!("{}{}", VLAN_PREFIX, id)
}

/// Extracts the VLAN ID from a name like "Vlan100".
pub fn vlan_id_from_name(name: &str) -> Option<VlanId> {
    let digits = name.strip_prefix(VLAN_PREFIX)?;
    // "Vlan010" would not round-trip through vlan_name
    if digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Returns the VLAN table key for an ID.
pub fn vlan_key(id: VlanId) -> Key {
    Key::new(vlan_name(id))
}

/// Returns the VLAN_MEMBER key for a (VLAN name, port) pair.
pub fn member_key(vlan_name: &str, port: &str) -> Key {
    Key::from_comps([vlan_name, port])
}
