//! VLAN and VLAN membership mutations
//!
//! Each `VLAN` row's `members@` list mirrors the `VLAN_MEMBER` rows under
//! it. CONFIG_DB has no multi-key transactions, so every operation that
//! touches both tables runs as a fixed sequence of phases. The sequence is
//! chosen so that an interruption leaves an orphan `VLAN_MEMBER` row (not
//! listed by its VLAN) rather than a `members@` entry with no row behind it.
//!
//! No operation rolls back phases already committed when a later step fails.

use tracing::{debug, info, instrument, warn};

use sonic_translib_common::{ConfigDb, Key, TranslibResult, Value};

use crate::keys::{member_key, vlan_key, vlan_name};
use crate::payload::MemberSpec;
use crate::reader::{load_vlan_row, require_vlan_row};
use crate::tables::{fields, VLAN_MEMBER_TABLE, VLAN_TABLE};
use crate::types::VlanId;

/// One step of a two-table write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Create or delete the affected `VLAN_MEMBER` rows
    MemberRows,
    /// Write or delete the `VLAN` row itself
    VlanRow,
}

/// Member rows are created before the list names them.
pub const ADD_MEMBERS_PHASES: [Phase; 2] = [Phase::MemberRows, Phase::VlanRow];

/// The list drops the port before its member row goes away.
pub const REMOVE_MEMBER_PHASES: [Phase; 2] = [Phase::VlanRow, Phase::MemberRows];

/// Cascade: member rows go first, then the VLAN row.
pub const DELETE_VLAN_PHASES: [Phase; 2] = [Phase::MemberRows, Phase::VlanRow];

/// Applies VLAN writes while keeping `members@` and `VLAN_MEMBER` in step.
pub struct VlanWriter<'a> {
    db: &'a dyn ConfigDb,
}

impl<'a> VlanWriter<'a> {
    /// Creates a writer over `db`.
    pub fn new(db: &'a dyn ConfigDb) -> Self {
        Self { db }
    }

    /// Creates one VLAN per ID, in order.
    ///
    /// A duplicate stops the batch with `AlreadyExists`; VLANs created
    /// earlier in the batch stay created.
    #[instrument(skip(self))]
    pub async fn create_vlans(&self, ids: &[VlanId]) -> TranslibResult<()> {
        for &id in ids {
            let mut row = Value::new();
            row.set(fields::VLAN_ID, id.to_string());

            self.db.create_entry(&VLAN_TABLE, &vlan_key(id), &row).await?;
            info!("Created {}", vlan_name(id));
        }
        Ok(())
    }

    /// Adds members to an existing VLAN.
    ///
    /// Member rows are created in request order; a port that already has a
    /// row stops the operation with `AlreadyExists` before the VLAN's list
    /// is touched. Rows created before the failure remain as orphans.
    #[instrument(skip(self))]
    pub async fn add_members(&self, id: VlanId, requested: &[MemberSpec]) -> TranslibResult<()> {
        let name = vlan_name(id);
        let mut row = require_vlan_row(self.db, id).await?;

        if requested.is_empty() {
            debug!("No members requested for {}", name);
            return Ok(());
        }

        let mut members = row.get_list(fields::MEMBERS);
        for spec in requested {
            if !members.contains(&spec.port) {
                members.push(spec.port.clone());
            }
        }

        for phase in ADD_MEMBERS_PHASES {
            match phase {
                Phase::MemberRows => {
                    for spec in requested {
                        let mut member = Value::new();
                        member.set(fields::TAGGING_MODE, spec.tagging_mode());

                        self.db
                            .create_entry(
                                &VLAN_MEMBER_TABLE,
                                &member_key(&name, &spec.port),
                                &member,
                            )
                            .await?;
                        info!(
                            "Added {} to {} as {}",
                            spec.port,
                            name,
                            spec.tagging_mode()
                        );
                    }
                }
                Phase::VlanRow => {
                    row.set_list(fields::MEMBERS, &members);
                    self.db.set_entry(&VLAN_TABLE, &vlan_key(id), &row).await?;
                    debug!("{} members now {:?}", name, members);
                }
            }
        }
        Ok(())
    }

    /// Deletes a VLAN and all of its member rows.
    ///
    /// Listed members go first, then any `VLAN_MEMBER` row under the VLAN
    /// that `members@` does not name (left by an interrupted add). Deleting
    /// an absent VLAN succeeds. The first failing member deletion stops the
    /// cascade; member rows already deleted stay deleted and the VLAN row is
    /// kept.
    #[instrument(skip(self))]
    pub async fn delete_vlan(&self, id: VlanId) -> TranslibResult<()> {
        let name = vlan_name(id);
        let Some(row) = load_vlan_row(self.db, id).await? else {
            debug!("{} does not exist, nothing to delete", name);
            return Ok(());
        };
        let members = row.get_list(fields::MEMBERS);

        for phase in DELETE_VLAN_PHASES {
            match phase {
                Phase::MemberRows => {
                    for port in &members {
                        self.delete_member_row(&name, port).await?;
                    }
                    for key in self.unlisted_member_rows(&name, &members).await? {
                        warn!("Deleting unlisted member row {}", key);
                        self.db.delete_entry(&VLAN_MEMBER_TABLE, &key).await?;
                    }
                }
                Phase::VlanRow => {
                    self.db.delete_entry(&VLAN_TABLE, &vlan_key(id)).await?;
                }
            }
        }

        info!("Deleted {} ({} members)", name, members.len());
        Ok(())
    }

    /// Removes one port from a VLAN.
    ///
    /// Removing a port that is not listed in the VLAN's members succeeds
    /// without writing anything.
    #[instrument(skip(self))]
    pub async fn remove_member(&self, id: VlanId, port: &str) -> TranslibResult<()> {
        let name = vlan_name(id);
        let mut row = require_vlan_row(self.db, id).await?;

        let members = row.get_list(fields::MEMBERS);
        let remaining: Vec<String> = members.iter().filter(|m| *m != port).cloned().collect();
        if remaining.len() == members.len() {
            debug!("{} is not a member of {}", port, name);
            return Ok(());
        }

        for phase in REMOVE_MEMBER_PHASES {
            match phase {
                Phase::VlanRow => {
                    row.set_list(fields::MEMBERS, &remaining);
                    self.db.set_entry(&VLAN_TABLE, &vlan_key(id), &row).await?;
                }
                Phase::MemberRows => {
                    self.delete_member_row(&name, port).await?;
                }
            }
        }

        info!("Removed {} from {}", port, name);
        Ok(())
    }

    /// Returns `VLAN_MEMBER` keys under `vlan_name` whose port is not in `listed`.
    async fn unlisted_member_rows(
        &self,
        vlan_name: &str,
        listed: &[String],
    ) -> TranslibResult<Vec<Key>> {
        let keys = self.db.get_keys(&VLAN_MEMBER_TABLE).await?;
        Ok(keys
            .into_iter()
            .filter(|key| key.get(0) == Some(vlan_name))
            .filter(|key| key.get(1).map_or(true, |port| !listed.iter().any(|m| m == port)))
            .collect())
    }

    async fn delete_member_row(&self, vlan_name: &str, port: &str) -> TranslibResult<()> {
        match self
            .db
            .delete_entry(&VLAN_MEMBER_TABLE, &member_key(vlan_name, port))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!("{} member row for {} already gone", vlan_name, port);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_translib_common::{DbOp, ErrorKind, JournalEntry, Key, MemoryDb};

    fn vid(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    fn members_of(db: &MemoryDb, id: u16) -> Vec<String> {
        db.entry(&VLAN_TABLE, &Key::new(format!("Vlan{}", id)))
            .map(|row| row.get_list(fields::MEMBERS))
            .unwrap_or_default()
    }

    #[test]
    fn test_phase_orders() {
        assert_eq!(ADD_MEMBERS_PHASES, [Phase::MemberRows, Phase::VlanRow]);
        assert_eq!(REMOVE_MEMBER_PHASES, [Phase::VlanRow, Phase::MemberRows]);
        assert_eq!(DELETE_VLAN_PHASES, [Phase::MemberRows, Phase::VlanRow]);
    }

    #[tokio::test]
    async fn test_create_vlans() {
        let db = MemoryDb::new();
        VlanWriter::new(&db)
            .create_vlans(&[vid(10), vid(20)])
            .await
            .unwrap();

        let row = db.entry(&VLAN_TABLE, &Key::new("Vlan10")).unwrap();
        assert_eq!(row.get(fields::VLAN_ID), Some("10"));
        assert!(row.get_list(fields::MEMBERS).is_empty());
        assert!(db.entry(&VLAN_TABLE, &Key::new("Vlan20")).is_some());
    }

    #[tokio::test]
    async fn test_add_members_writes_rows_before_list() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10)]).await.unwrap();
        db.clear_journal();

        writer
            .add_members(
                vid(10),
                &[
                    MemberSpec::new("Ethernet0", None),
                    MemberSpec::new("Ethernet4", Some("untagged")),
                ],
            )
            .await
            .unwrap();

        assert_eq!(
            db.journal(),
            vec![
                JournalEntry::new(DbOp::Create, "VLAN_MEMBER", member_key("Vlan10", "Ethernet0")),
                JournalEntry::new(DbOp::Create, "VLAN_MEMBER", member_key("Vlan10", "Ethernet4")),
                JournalEntry::new(DbOp::Set, "VLAN", Key::new("Vlan10")),
            ]
        );
        assert_eq!(members_of(&db, 10), vec!["Ethernet0", "Ethernet4"]);

        let row = db
            .entry(&VLAN_MEMBER_TABLE, &member_key("Vlan10", "Ethernet0"))
            .unwrap();
        assert_eq!(row.get(fields::TAGGING_MODE), Some("tagged"));
    }

    #[tokio::test]
    async fn test_add_members_missing_vlan() {
        let db = MemoryDb::new();
        let err = VlanWriter::new(&db)
            .add_members(vid(10), &[MemberSpec::new("Ethernet0", None)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(db.is_empty());
    }

    #[tokio::test]
    async fn test_add_duplicate_member_leaves_list_untouched() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10)]).await.unwrap();
        writer
            .add_members(vid(10), &[MemberSpec::new("Ethernet4", None)])
            .await
            .unwrap();

        let err = writer
            .add_members(
                vid(10),
                &[
                    MemberSpec::new("Ethernet0", None),
                    MemberSpec::new("Ethernet4", None),
                    MemberSpec::new("Ethernet8", None),
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        // Ethernet0 was committed before the failure and is now an orphan
        assert_eq!(members_of(&db, 10), vec!["Ethernet4"]);
        assert!(db
            .entry(&VLAN_MEMBER_TABLE, &member_key("Vlan10", "Ethernet0"))
            .is_some());
        assert!(db
            .entry(&VLAN_MEMBER_TABLE, &member_key("Vlan10", "Ethernet8"))
            .is_none());
    }

    #[tokio::test]
    async fn test_add_empty_member_list_is_noop() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10)]).await.unwrap();
        db.clear_journal();

        writer.add_members(vid(10), &[]).await.unwrap();
        assert!(db.journal().is_empty());
    }

    #[tokio::test]
    async fn test_remove_member_writes_list_before_row() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10)]).await.unwrap();
        writer
            .add_members(
                vid(10),
                &[
                    MemberSpec::new("Ethernet0", None),
                    MemberSpec::new("Ethernet4", None),
                ],
            )
            .await
            .unwrap();
        db.clear_journal();

        writer.remove_member(vid(10), "Ethernet0").await.unwrap();

        assert_eq!(
            db.journal(),
            vec![
                JournalEntry::new(DbOp::Set, "VLAN", Key::new("Vlan10")),
                JournalEntry::new(DbOp::Delete, "VLAN_MEMBER", member_key("Vlan10", "Ethernet0")),
            ]
        );
        assert_eq!(members_of(&db, 10), vec!["Ethernet4"]);
    }

    #[tokio::test]
    async fn test_remove_member_failure_leaves_orphan_row() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10)]).await.unwrap();
        writer
            .add_members(vid(10), &[MemberSpec::new("Ethernet0", None)])
            .await
            .unwrap();
        db.fail_on(
            DbOp::Delete,
            &VLAN_MEMBER_TABLE,
            member_key("Vlan10", "Ethernet0"),
        );

        let err = writer.remove_member(vid(10), "Ethernet0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Db);

        // The list no longer references the port; the row lingers
        assert!(members_of(&db, 10).is_empty());
        assert!(db
            .entry(&VLAN_MEMBER_TABLE, &member_key("Vlan10", "Ethernet0"))
            .is_some());
    }

    #[tokio::test]
    async fn test_remove_non_member_is_noop() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10)]).await.unwrap();
        db.clear_journal();

        writer.remove_member(vid(10), "Ethernet0").await.unwrap();
        assert!(db.journal().is_empty());

        let err = writer.remove_member(vid(11), "Ethernet0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_vlan_cascades() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10)]).await.unwrap();
        writer
            .add_members(
                vid(10),
                &[
                    MemberSpec::new("Ethernet0", None),
                    MemberSpec::new("Ethernet4", None),
                ],
            )
            .await
            .unwrap();
        db.clear_journal();

        writer.delete_vlan(vid(10)).await.unwrap();

        assert_eq!(
            db.journal(),
            vec![
                JournalEntry::new(DbOp::Delete, "VLAN_MEMBER", member_key("Vlan10", "Ethernet0")),
                JournalEntry::new(DbOp::Delete, "VLAN_MEMBER", member_key("Vlan10", "Ethernet4")),
                JournalEntry::new(DbOp::Delete, "VLAN", Key::new("Vlan10")),
            ]
        );
        assert!(db.is_empty());
    }

    #[tokio::test]
    async fn test_delete_vlan_partial_cascade() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10)]).await.unwrap();
        writer
            .add_members(
                vid(10),
                &[
                    MemberSpec::new("Ethernet0", None),
                    MemberSpec::new("Ethernet4", None),
                ],
            )
            .await
            .unwrap();
        db.fail_on(
            DbOp::Delete,
            &VLAN_MEMBER_TABLE,
            member_key("Vlan10", "Ethernet4"),
        );

        let err = writer.delete_vlan(vid(10)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Db);

        assert!(db
            .entry(&VLAN_MEMBER_TABLE, &member_key("Vlan10", "Ethernet0"))
            .is_none());
        assert!(db
            .entry(&VLAN_MEMBER_TABLE, &member_key("Vlan10", "Ethernet4"))
            .is_some());
        assert!(db.entry(&VLAN_TABLE, &Key::new("Vlan10")).is_some());
    }

    #[tokio::test]
    async fn test_delete_vlan_sweeps_unlisted_member_rows() {
        let db = MemoryDb::new();
        let writer = VlanWriter::new(&db);
        writer.create_vlans(&[vid(10), vid(20)]).await.unwrap();
        writer
            .add_members(vid(10), &[MemberSpec::new("Ethernet0", None)])
            .await
            .unwrap();
        let mut orphan = Value::new();
        orphan.set(fields::TAGGING_MODE, "untagged");
        db.insert(&VLAN_MEMBER_TABLE, member_key("Vlan10", "Ethernet4"), orphan.clone());
        db.insert(&VLAN_MEMBER_TABLE, member_key("Vlan20", "Ethernet4"), orphan);
        db.clear_journal();

        writer.delete_vlan(vid(10)).await.unwrap();

        assert_eq!(
            db.journal(),
            vec![
                JournalEntry::new(DbOp::Delete, "VLAN_MEMBER", member_key("Vlan10", "Ethernet0")),
                JournalEntry::new(DbOp::Delete, "VLAN_MEMBER", member_key("Vlan10", "Ethernet4")),
                JournalEntry::new(DbOp::Delete, "VLAN", Key::new("Vlan10")),
            ]
        );
        assert!(db
            .entry(&VLAN_MEMBER_TABLE, &member_key("Vlan20", "Ethernet4"))
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_vlan_is_noop() {
        let db = MemoryDb::new();
        VlanWriter::new(&db).delete_vlan(vid(10)).await.unwrap();
        assert!(db.journal().is_empty());
    }
}
