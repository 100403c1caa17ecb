//! Type definitions for vlanapp

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use sonic_translib_common::TranslibError;

/// Tagging mode given to members added without an explicit mode.
pub const DEFAULT_TAGGING_MODE: &str = "tagged";

/// IEEE 802.1Q VLAN identifier (1-4094).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID.
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID.
    pub const MAX: u16 = 4094;

    /// Creates a VLAN ID, rejecting values outside 1-4094.
    pub fn new(id: u16) -> Result<Self, TranslibError> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(VlanId(id))
        } else {
            Err(TranslibError::invalid_args(format!(
                "invalid VLAN ID {} (must be {}-{})",
                id,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Returns the VLAN ID as a u16.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VlanId {
    type Err = TranslibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u16 = s
            .parse()
            .map_err(|_| TranslibError::invalid_args(format!("invalid VLAN ID '{}'", s)))?;
        VlanId::new(id)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = TranslibError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        VlanId::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> u16 {
        vlan.0
    }
}

/// Public view of one VLAN member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    /// Port alias
    pub port: String,
    /// Tagging mode; absent when the member row is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl MemberView {
    /// Creates a member view.
    pub fn new(port: impl Into<String>, mode: Option<String>) -> Self {
        Self {
            port: port.into(),
            mode,
        }
    }
}

/// Public view of one VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanView {
    /// VLAN ID
    pub id: VlanId,
    /// VLAN name (e.g., "Vlan10")
    pub name: String,
    /// Members in `members@` order
    pub members: Vec<MemberView>,
}
