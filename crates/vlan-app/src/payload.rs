//! Request body schemas
//!
//! Bodies are decoded eagerly into one of two typed shapes before any store
//! access. A body that does not fit its schema is rejected as invalid
//! arguments and never reaches the writer.

use serde::Deserialize;

use sonic_translib_common::{TranslibError, TranslibResult};

use crate::types::{VlanId, DEFAULT_TAGGING_MODE};

/// Characters that would corrupt CONFIG_DB keys or list fields.
const RESERVED_PORT_CHARS: &[char] = &['|', ',', '/'];

/// Which body shape an operation expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSchema {
    /// JSON array of VLAN IDs: `[10, 20]`
    VlanIds,
    /// JSON array of members: `[{"port": "Ethernet0", "mode": "untagged"}]`
    Members,
}

/// One member requested by an add-members body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberSpec {
    /// Port alias
    pub port: String,
    /// Tagging mode; defaults to "tagged"
    #[serde(default)]
    pub mode: Option<String>,
}

impl MemberSpec {
    /// Creates a member spec.
    pub fn new(port: impl Into<String>, mode: Option<&str>) -> Self {
        Self {
            port: port.into(),
            mode: mode.map(str::to_string),
        }
    }

    /// Returns the requested tagging mode, or the default.
    pub fn tagging_mode(&self) -> &str {
        self.mode.as_deref().unwrap_or(DEFAULT_TAGGING_MODE)
    }

    fn validate(&self) -> TranslibResult<()> {
        if self.port.is_empty() {
            return Err(TranslibError::invalid_args("member port must not be empty"));
        }
        if self.port.contains(RESERVED_PORT_CHARS) {
            return Err(TranslibError::invalid_args(format!(
                "member port '{}' contains a reserved character",
                self.port
            )));
        }
        if matches!(self.mode.as_deref(), Some("")) {
            return Err(TranslibError::invalid_args(format!(
                "tagging mode for '{}' must not be empty",
                self.port
            )));
        }
        Ok(())
    }
}

/// A decoded request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// VLANs to create
    VlanIds(Vec<VlanId>),
    /// Members to add
    Members(Vec<MemberSpec>),
}

impl Payload {
    /// Decodes `bytes` according to `schema`.
    pub fn parse(schema: PayloadSchema, bytes: &[u8]) -> TranslibResult<Self> {
        match schema {
            PayloadSchema::VlanIds => {
                let ids: Vec<VlanId> = decode(bytes, "an array of VLAN IDs")?;
                Ok(Payload::VlanIds(ids))
            }
            PayloadSchema::Members => {
                let members: Vec<MemberSpec> = decode(bytes, "an array of {port, mode?} objects")?;
                for member in &members {
                    member.validate()?;
                }
                Ok(Payload::Members(members))
            }
        }
    }

    /// Returns the schema this payload satisfies.
    pub fn schema(&self) -> PayloadSchema {
        match self {
            Payload::VlanIds(_) => PayloadSchema::VlanIds,
            Payload::Members(_) => PayloadSchema::Members,
        }
    }
}

/// Validates that a path-supplied port name is usable as a key component.
pub fn validate_port_name(port: &str) -> TranslibResult<()> {
    MemberSpec::new(port, None).validate()
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8], expected: &str) -> TranslibResult<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        TranslibError::invalid_args(format!("request body must be {}: {}", expected, e))
    })
}
