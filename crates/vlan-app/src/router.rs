//! Request routing for the `/vlan` path family
//!
//! A static table maps each (template, operation) pair to one action. Pairs
//! missing from the table are unsupported.

use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument};

use sonic_translib_common::{
    AppResponse, ConfigDb, OpKind, PathInfo, TranslibError, TranslibResult,
};

use crate::payload::{validate_port_name, Payload, PayloadSchema};
use crate::reader::VlanReader;
use crate::types::VlanId;
use crate::writer::VlanWriter;

/// `/vlan`
pub const VLAN_LIST_PATH: &str = "/vlan";
/// `/vlan/{id}`
pub const VLAN_PATH: &str = "/vlan/{id}";
/// `/vlan/{id}/member`
pub const VLAN_MEMBER_LIST_PATH: &str = "/vlan/{id}/member";
/// `/vlan/{id}/member/{port}`
pub const VLAN_MEMBER_PATH: &str = "/vlan/{id}/member/{port}";

/// All templates served by the VLAN application.
pub const VLAN_TEMPLATES: &[&str] = &[
    VLAN_LIST_PATH,
    VLAN_PATH,
    VLAN_MEMBER_LIST_PATH,
    VLAN_MEMBER_PATH,
];

/// Path template variable holding the VLAN ID
pub const VAR_ID: &str = "id";
/// Path template variable holding the port alias
pub const VAR_PORT: &str = "port";

/// Known path templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// `/vlan`
    VlanList,
    /// `/vlan/{id}`
    Vlan,
    /// `/vlan/{id}/member`
    VlanMemberList,
    /// `/vlan/{id}/member/{port}`
    VlanMember,
}

impl Template {
    /// Looks up a template by its string form.
    pub fn from_path(template: &str) -> Option<Self> {
        match template {
            VLAN_LIST_PATH => Some(Template::VlanList),
            VLAN_PATH => Some(Template::Vlan),
            VLAN_MEMBER_LIST_PATH => Some(Template::VlanMemberList),
            VLAN_MEMBER_PATH => Some(Template::VlanMember),
            _ => None,
        }
    }

    /// Returns the template string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Template::VlanList => VLAN_LIST_PATH,
            Template::Vlan => VLAN_PATH,
            Template::VlanMemberList => VLAN_MEMBER_LIST_PATH,
            Template::VlanMember => VLAN_MEMBER_PATH,
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reader or writer operation selected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create a batch of VLANs
    CreateVlans,
    /// Read every VLAN
    GetAllVlans,
    /// Read one VLAN
    GetVlan,
    /// Delete one VLAN with its members
    DeleteVlan,
    /// Add a batch of members to one VLAN
    AddMembers,
    /// Remove one member from one VLAN
    RemoveMember,
}

impl Action {
    /// Returns the body schema the action consumes, if any.
    pub fn schema(&self) -> Option<PayloadSchema> {
        match self {
            Action::CreateVlans => Some(PayloadSchema::VlanIds),
            Action::AddMembers => Some(PayloadSchema::Members),
            Action::GetAllVlans | Action::GetVlan | Action::DeleteVlan | Action::RemoveMember => {
                None
            }
        }
    }
}

/// Supported (template, operation) pairs.
pub const ROUTES: &[(Template, OpKind, Action)] = &[
    (Template::VlanList, OpKind::Create, Action::CreateVlans),
    (Template::VlanList, OpKind::Get, Action::GetAllVlans),
    (Template::Vlan, OpKind::Get, Action::GetVlan),
    (Template::Vlan, OpKind::Delete, Action::DeleteVlan),
    (Template::VlanMemberList, OpKind::Create, Action::AddMembers),
    (Template::VlanMember, OpKind::Delete, Action::RemoveMember),
];

/// Resolves a template string and operation to an action.
pub fn resolve(template: &str, op: OpKind) -> TranslibResult<Action> {
    let known = Template::from_path(template)
        .ok_or_else(|| TranslibError::unsupported(format!("unknown path template '{}'", template)))?;

    ROUTES
        .iter()
        .find(|(t, o, _)| *t == known && *o == op)
        .map(|(_, _, action)| *action)
        .ok_or_else(|| TranslibError::unsupported(format!("{} not supported on {}", op, known)))
}

/// Resolves and executes one request against `db`.
///
/// The body is decoded before any store access, so a malformed body never
/// causes a write.
#[instrument(skip(db, payload), fields(template = %path.template))]
pub async fn dispatch(
    db: &dyn ConfigDb,
    path: &PathInfo,
    op: OpKind,
    payload: &[u8],
) -> TranslibResult<AppResponse> {
    let action = resolve(&path.template, op)?;
    let body = action
        .schema()
        .map(|schema| Payload::parse(schema, payload))
        .transpose()?;
    debug!("{} {} -> {:?}", op, path.path, action);

    let reader = VlanReader::new(db);
    let writer = VlanWriter::new(db);

    match (action, body) {
        (Action::CreateVlans, Some(Payload::VlanIds(ids))) => {
            writer.create_vlans(&ids).await?;
            Ok(AppResponse::empty())
        }
        (Action::GetAllVlans, _) => {
            let views = reader.get_all_vlans().await?;
            Ok(AppResponse::with_payload(to_tree(&views)?))
        }
        (Action::GetVlan, _) => {
            let view = reader.get_vlan(vlan_id_var(path)?).await?;
            Ok(AppResponse::with_payload(to_tree(&view)?))
        }
        (Action::DeleteVlan, _) => {
            writer.delete_vlan(vlan_id_var(path)?).await?;
            Ok(AppResponse::empty())
        }
        (Action::AddMembers, Some(Payload::Members(members))) => {
            writer.add_members(vlan_id_var(path)?, &members).await?;
            Ok(AppResponse::empty())
        }
        (Action::RemoveMember, _) => {
            let id = vlan_id_var(path)?;
            let port = port_var(path)?;
            writer.remove_member(id, port).await?;
            Ok(AppResponse::empty())
        }
        (action, _) => Err(TranslibError::invalid_args(format!(
            "request body does not match {:?}",
            action
        ))),
    }
}

fn to_tree<T: Serialize>(value: &T) -> TranslibResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| TranslibError::internal(format!("failed to encode response: {}", e)))
}

fn vlan_id_var(path: &PathInfo) -> TranslibResult<VlanId> {
    path.var(VAR_ID)
        .ok_or_else(|| TranslibError::invalid_args(format!("missing '{}' in {}", VAR_ID, path.path)))?
        .parse()
}

fn port_var(path: &PathInfo) -> TranslibResult<&str> {
    let port = path
        .var(VAR_PORT)
        .ok_or_else(|| TranslibError::invalid_args(format!("missing '{}' in {}", VAR_PORT, path.path)))?;
    validate_port_name(port)?;
    Ok(port)
}
