//! Team member repository contract and SQLite implementation.
//!
//! # Invariants
//! - Member listing is deterministic: `sort_order ASC, member_uuid ASC`.
//! - `menu_uuid` must reference an existing menu (enforced by foreign key).

use super::schema::{ensure_collection_ready, parse_uuid};
use super::{Collection, RepoError, RepoResult};
use crate::model::member::{Member, MemberId, MemberPatch, NewMember};
use crate::model::menu::MenuId;
use crate::model::validation::{ensure_order, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const MEMBER_SELECT_SQL: &str = "SELECT
    member_uuid,
    menu_uuid,
    name,
    designation,
    location,
    image_ref,
    sort_order,
    created_at,
    updated_at
FROM team_members";

const MEMBER_COLUMNS: &[&str] = &[
    "member_uuid",
    "menu_uuid",
    "name",
    "designation",
    "location",
    "image_ref",
    "sort_order",
    "created_at",
    "updated_at",
];

/// Menu ids bound per `IN (...)` query; stays well under SQLite's variable limit.
const MAX_IN_LIST_BINDS: usize = 500;

/// Ordered query filter over the `teamMembers` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberFilter {
    All,
    InMenu(MenuId),
    InMenus(Vec<MenuId>),
}

/// Repository interface for the `teamMembers` collection.
pub trait MemberRepository {
    fn create_member(&self, member: &NewMember) -> RepoResult<Member>;
    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn list_members(&self, filter: &MemberFilter) -> RepoResult<Vec<Member>>;
    fn update_member(&self, id: MemberId, patch: &MemberPatch) -> RepoResult<Member>;
    fn update_orders(&self, changes: &[(MemberId, i64)]) -> RepoResult<()>;
    fn delete_member(&self, id: MemberId) -> RepoResult<()>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_collection_ready(conn, Collection::TeamMembers, MEMBER_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn create_member(&self, member: &NewMember) -> RepoResult<Member> {
        let draft = member.draft.normalized()?;
        let order = ensure_order(member.order)?;
        let id = Uuid::new_v4();

        self.conn.execute(
            "INSERT INTO team_members (
                member_uuid,
                menu_uuid,
                name,
                designation,
                location,
                image_ref,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                member.menu_id.to_string(),
                draft.name,
                draft.designation,
                draft.location,
                draft.image_ref,
                order,
            ],
        )?;
        load_required_member(self.conn, id)
    }

    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE member_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }
        Ok(None)
    }

    fn list_members(&self, filter: &MemberFilter) -> RepoResult<Vec<Member>> {
        match filter {
            MemberFilter::All => query_members(self.conn, "", Vec::new()),
            MemberFilter::InMenu(menu_id) => query_members(
                self.conn,
                "WHERE menu_uuid = ?",
                vec![Value::Text(menu_id.to_string())],
            ),
            MemberFilter::InMenus(menu_ids) => {
                let mut members = Vec::new();
                for chunk in menu_ids.chunks(MAX_IN_LIST_BINDS) {
                    let placeholders = vec!["?"; chunk.len()].join(", ");
                    members.extend(query_members(
                        self.conn,
                        &format!("WHERE menu_uuid IN ({placeholders})"),
                        chunk.iter().map(|id| Value::Text(id.to_string())).collect(),
                    )?);
                }
                if menu_ids.len() > MAX_IN_LIST_BINDS {
                    members.sort_by_key(|member| (member.menu_id, member.order, member.id));
                }
                Ok(members)
            }
        }
    }

    fn update_member(&self, id: MemberId, patch: &MemberPatch) -> RepoResult<Member> {
        if patch.is_empty() {
            return load_required_member(self.conn, id);
        }

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ValidationError::BlankMemberName.into());
            }
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(designation) = &patch.designation {
            assignments.push("designation = ?");
            bind_values.push(Value::Text(designation.clone()));
        }
        if let Some(location) = &patch.location {
            assignments.push("location = ?");
            bind_values.push(Value::Text(location.clone()));
        }
        if let Some(image_ref) = &patch.image_ref {
            assignments.push("image_ref = ?");
            bind_values.push(image_ref.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(menu_id) = patch.menu_id {
            assignments.push("menu_uuid = ?");
            bind_values.push(Value::Text(menu_id.to_string()));
        }
        if let Some(order) = patch.order {
            assignments.push("sort_order = ?");
            bind_values.push(Value::Integer(ensure_order(order)?));
        }
        bind_values.push(Value::Text(id.to_string()));

        let changed = self.conn.execute(
            &format!(
                "UPDATE team_members
                 SET {},
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE member_uuid = ?;",
                assignments.join(", ")
            ),
            params_from_iter(bind_values),
        )?;
        if changed == 0 {
            return Err(RepoError::MemberNotFound(id));
        }
        load_required_member(self.conn, id)
    }

    fn update_orders(&self, changes: &[(MemberId, i64)]) -> RepoResult<()> {
        for (_, order) in changes {
            ensure_order(*order)?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (id, order) in changes {
            let changed = tx.execute(
                "UPDATE team_members
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE member_uuid = ?1;",
                params![id.to_string(), order],
            )?;
            if changed == 0 {
                return Err(RepoError::MemberNotFound(*id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_member(&self, id: MemberId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM team_members WHERE member_uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::MemberNotFound(id));
        }
        Ok(())
    }
}

fn query_members(
    conn: &Connection,
    clause: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<Member>> {
    let mut stmt = conn.prepare(&format!(
        "{MEMBER_SELECT_SQL} {clause} ORDER BY menu_uuid ASC, sort_order ASC, member_uuid ASC;"
    ))?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        members.push(parse_member_row(row)?);
    }
    Ok(members)
}

fn load_required_member(conn: &Connection, id: MemberId) -> RepoResult<Member> {
    let mut stmt = conn.prepare(&format!("{MEMBER_SELECT_SQL} WHERE member_uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_member_row(row);
    }
    Err(RepoError::MemberNotFound(id))
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let id_text: String = row.get("member_uuid")?;
    let menu_text: String = row.get("menu_uuid")?;
    let order: i64 = row.get("sort_order")?;
    if order < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid sort_order `{order}` in team_members.sort_order"
        )));
    }

    Ok(Member {
        id: parse_uuid(&id_text, "team_members.member_uuid")?,
        menu_id: parse_uuid(&menu_text, "team_members.menu_uuid")?,
        name: row.get("name")?,
        designation: row.get("designation")?,
        location: row.get("location")?,
        image_ref: row.get("image_ref")?,
        order,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
