//! VLAN view assembly from CONFIG_DB rows

use tracing::{debug, instrument, warn};

use sonic_translib_common::{ConfigDb, TranslibError, TranslibResult, Value};

use crate::keys::{member_key, vlan_id_from_name, vlan_key, vlan_name};
use crate::tables::{fields, VLAN_MEMBER_TABLE, VLAN_TABLE};
use crate::types::{MemberView, VlanId, VlanView};

/// Reads the VLAN row for `id`, mapping absence to `None`.
pub(crate) async fn load_vlan_row(db: &dyn ConfigDb, id: VlanId) -> TranslibResult<Option<Value>> {
    match db.get_entry(&VLAN_TABLE, &vlan_key(id)).await {
        Ok(row) => Ok(Some(row)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Reads the VLAN row for `id`, failing with NotFound when absent.
pub(crate) async fn require_vlan_row(db: &dyn ConfigDb, id: VlanId) -> TranslibResult<Value> {
    load_vlan_row(db, id)
        .await?
        .ok_or_else(|| TranslibError::not_found(vlan_name(id)))
}

/// Builds VLAN views by joining `VLAN` rows with their `VLAN_MEMBER` rows.
pub struct VlanReader<'a> {
    db: &'a dyn ConfigDb,
}

impl<'a> VlanReader<'a> {
    /// Creates a reader over `db`.
    pub fn new(db: &'a dyn ConfigDb) -> Self {
        Self { db }
    }

    /// Returns the view of one VLAN.
    ///
    /// Members listed in `members@` whose `VLAN_MEMBER` row is missing are
    /// still reported, without a tagging mode.
    #[instrument(skip(self))]
    pub async fn get_vlan(&self, id: VlanId) -> TranslibResult<VlanView> {
        let row = require_vlan_row(self.db, id).await?;
        self.build_view(id, &row).await
    }

    /// Returns the views of all VLANs in table enumeration order.
    #[instrument(skip(self))]
    pub async fn get_all_vlans(&self) -> TranslibResult<Vec<VlanView>> {
        let keys = self.db.get_keys(&VLAN_TABLE).await?;
        let mut views = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(id) = key.get(0).and_then(vlan_id_from_name) else {
                warn!("Skipping VLAN row with unexpected key '{}'", key);
                continue;
            };

            // A row deleted since enumeration is simply gone
            match load_vlan_row(self.db, id).await? {
                Some(row) => views.push(self.build_view(id, &row).await?),
                None => debug!("{} disappeared during enumeration", key),
            }
        }

        debug!("Read {} VLANs", views.len());
        Ok(views)
    }

    async fn build_view(&self, id: VlanId, row: &Value) -> TranslibResult<VlanView> {
        let name = vlan_name(id);
        let ports = row.get_list(fields::MEMBERS);
        let mut members = Vec::with_capacity(ports.len());

        for port in ports {
            let mode = match self
                .db
                .get_entry(&VLAN_MEMBER_TABLE, &member_key(&name, &port))
                .await
            {
                Ok(member) => member.get(fields::TAGGING_MODE).map(str::to_string),
                Err(e) if e.is_not_found() => {
                    warn!("{} lists {} but its VLAN_MEMBER row is missing", name, port);
                    None
                }
                Err(e) => return Err(e.into()),
            };
            members.push(MemberView::new(port, mode));
        }

        Ok(VlanView { id, name, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_translib_common::{DbOp, ErrorKind, Key, MemoryDb};

    fn vid(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    fn seed_vlan(db: &MemoryDb, id: u16, members: &[(&str, Option<&str>)]) {
        let name = format!("Vlan{}", id);
        let mut row = Value::from_pairs([(fields::VLAN_ID, id.to_string())]);
        let ports: Vec<&str> = members.iter().map(|(p, _)| *p).collect();
        row.set_list(fields::MEMBERS, &ports);
        db.insert(&VLAN_TABLE, Key::new(&name), row);

        for (port, mode) in members {
            if let Some(mode) = mode {
                db.insert(
                    &VLAN_MEMBER_TABLE,
                    member_key(&name, port),
                    Value::from_pairs([(fields::TAGGING_MODE, *mode)]),
                );
            }
        }
    }

    #[tokio::test]
    async fn test_get_vlan_joins_member_rows() {
        let db = MemoryDb::new();
        seed_vlan(
            &db,
            10,
            &[("Ethernet0", Some("tagged")), ("Ethernet4", Some("untagged"))],
        );

        let view = VlanReader::new(&db).get_vlan(vid(10)).await.unwrap();
        assert_eq!(
            view,
            VlanView {
                id: vid(10),
                name: "Vlan10".to_string(),
                members: vec![
                    MemberView::new("Ethernet0", Some("tagged".to_string())),
                    MemberView::new("Ethernet4", Some("untagged".to_string())),
                ],
            }
        );
    }

    #[tokio::test]
    async fn test_get_vlan_tolerates_missing_member_row() {
        let db = MemoryDb::new();
        seed_vlan(&db, 10, &[("Ethernet0", None), ("Ethernet4", Some("tagged"))]);

        let view = VlanReader::new(&db).get_vlan(vid(10)).await.unwrap();
        assert_eq!(view.members[0], MemberView::new("Ethernet0", None));
        assert_eq!(view.members[1].mode.as_deref(), Some("tagged"));
    }

    #[tokio::test]
    async fn test_get_vlan_not_found() {
        let db = MemoryDb::new();
        let err = VlanReader::new(&db).get_vlan(vid(99)).await.unwrap_err();
        assert_eq!(err, TranslibError::not_found("Vlan99"));
    }

    #[tokio::test]
    async fn test_get_all_vlans_skips_foreign_keys() {
        let db = MemoryDb::new();
        seed_vlan(&db, 20, &[]);
        seed_vlan(&db, 10, &[("Ethernet0", Some("tagged"))]);
        db.insert(&VLAN_TABLE, Key::new("bogus"), Value::new());

        let views = VlanReader::new(&db).get_all_vlans().await.unwrap();
        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Vlan10", "Vlan20"]);
        assert!(views[1].members.is_empty());
    }

    #[tokio::test]
    async fn test_get_all_vlans_empty_table() {
        let db = MemoryDb::new();
        let views = VlanReader::new(&db).get_all_vlans().await.unwrap();
        assert!(views.is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_abort_read() {
        let db = MemoryDb::new();
        seed_vlan(&db, 10, &[("Ethernet0", Some("tagged"))]);
        db.fail_on(
            DbOp::Get,
            &VLAN_MEMBER_TABLE,
            member_key("Vlan10", "Ethernet0"),
        );

        let err = VlanReader::new(&db).get_vlan(vid(10)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Db);

        let err = VlanReader::new(&db).get_all_vlans().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Db);
    }
}
