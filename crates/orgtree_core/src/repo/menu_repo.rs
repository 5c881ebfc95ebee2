//! Menu node repository contract and SQLite implementation.
//!
//! # Invariants
//! - Child listing is deterministic: `sort_order ASC, node_uuid ASC`.
//! - `delete_node` removes exactly one record; the foreign key rejects removing
//!   a node that still owns children or members.
//! - `update_orders` applies all rank changes in one transaction.

use super::schema::{ensure_collection_ready, parse_optional_uuid, parse_uuid};
use super::{Collection, RepoError, RepoResult};
use crate::model::menu::{MenuId, MenuKind, MenuNode, MenuPatch, NewMenuNode};
use crate::model::validation::{ensure_order, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const MENU_SELECT_SQL: &str = "SELECT
    node_uuid,
    kind,
    parent_uuid,
    title,
    level,
    sort_order,
    created_at,
    updated_at
FROM menu_items";

const MENU_COLUMNS: &[&str] = &[
    "node_uuid",
    "kind",
    "parent_uuid",
    "title",
    "level",
    "sort_order",
    "created_at",
    "updated_at",
];

/// Ordered query filter over the `menuItems` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuFilter {
    /// Every node, grouped by level then parent.
    All,
    /// Main menus only.
    Roots,
    /// Direct children of one node.
    ChildrenOf(MenuId),
}

impl MenuFilter {
    /// Filter that selects siblings under `parent_id`.
    pub fn siblings(parent_id: Option<MenuId>) -> Self {
        match parent_id {
            Some(parent_id) => Self::ChildrenOf(parent_id),
            None => Self::Roots,
        }
    }
}

/// Repository interface for the `menuItems` collection.
pub trait MenuRepository {
    /// Inserts one node with a generated id.
    fn create_node(&self, node: &NewMenuNode) -> RepoResult<MenuNode>;
    /// Loads one node by id.
    fn get_node(&self, id: MenuId) -> RepoResult<Option<MenuNode>>;
    /// Lists nodes in deterministic order.
    fn list_nodes(&self, filter: MenuFilter) -> RepoResult<Vec<MenuNode>>;
    /// Applies a partial update and returns the stored record.
    fn update_node(&self, id: MenuId, patch: &MenuPatch) -> RepoResult<MenuNode>;
    /// Rewrites sibling ranks together.
    fn update_orders(&self, changes: &[(MenuId, i64)]) -> RepoResult<()>;
    /// Removes one node.
    fn delete_node(&self, id: MenuId) -> RepoResult<()>;
}

/// SQLite-backed menu repository.
pub struct SqliteMenuRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMenuRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_collection_ready(conn, Collection::MenuItems, MENU_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl MenuRepository for SqliteMenuRepository<'_> {
    fn create_node(&self, node: &NewMenuNode) -> RepoResult<MenuNode> {
        let id = Uuid::new_v4();
        MenuNode {
            id,
            kind: node.kind,
            parent_id: node.parent_id,
            title: node.title.clone(),
            level: node.level,
            order: node.order,
            created_at: 0,
            updated_at: 0,
        }
        .validate()?;

        self.conn.execute(
            "INSERT INTO menu_items (
                node_uuid,
                kind,
                parent_uuid,
                title,
                level,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                node.kind.as_str(),
                node.parent_id.map(|value| value.to_string()),
                node.title.as_str(),
                node.level,
                node.order,
            ],
        )?;
        load_required_node(self.conn, id)
    }

    fn get_node(&self, id: MenuId) -> RepoResult<Option<MenuNode>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MENU_SELECT_SQL} WHERE node_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_menu_row(row)?));
        }
        Ok(None)
    }

    fn list_nodes(&self, filter: MenuFilter) -> RepoResult<Vec<MenuNode>> {
        let (clause, bind): (&str, Option<String>) = match filter {
            MenuFilter::All => (
                "ORDER BY level ASC, parent_uuid ASC, sort_order ASC, node_uuid ASC",
                None,
            ),
            MenuFilter::Roots => (
                "WHERE parent_uuid IS NULL ORDER BY sort_order ASC, node_uuid ASC",
                None,
            ),
            MenuFilter::ChildrenOf(parent_id) => (
                "WHERE parent_uuid = ?1 ORDER BY sort_order ASC, node_uuid ASC",
                Some(parent_id.to_string()),
            ),
        };

        let mut stmt = self.conn.prepare(&format!("{MENU_SELECT_SQL} {clause};"))?;
        let mut rows = match bind {
            Some(value) => stmt.query([value])?,
            None => stmt.query([])?,
        };

        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_menu_row(row)?);
        }
        Ok(nodes)
    }

    fn update_node(&self, id: MenuId, patch: &MenuPatch) -> RepoResult<MenuNode> {
        if patch.is_empty() {
            return load_required_node(self.conn, id);
        }

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(ValidationError::BlankTitle.into());
            }
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(order) = patch.order {
            assignments.push("sort_order = ?");
            bind_values.push(Value::Integer(ensure_order(order)?));
        }
        bind_values.push(Value::Text(id.to_string()));

        let changed = self.conn.execute(
            &format!(
                "UPDATE menu_items
                 SET {},
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE node_uuid = ?;",
                assignments.join(", ")
            ),
            params_from_iter(bind_values),
        )?;
        if changed == 0 {
            return Err(RepoError::NodeNotFound(id));
        }
        load_required_node(self.conn, id)
    }

    fn update_orders(&self, changes: &[(MenuId, i64)]) -> RepoResult<()> {
        for (_, order) in changes {
            ensure_order(*order)?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (id, order) in changes {
            let changed = tx.execute(
                "UPDATE menu_items
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE node_uuid = ?1;",
                params![id.to_string(), order],
            )?;
            if changed == 0 {
                return Err(RepoError::NodeNotFound(*id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_node(&self, id: MenuId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM menu_items WHERE node_uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NodeNotFound(id));
        }
        Ok(())
    }
}

fn load_required_node(conn: &Connection, id: MenuId) -> RepoResult<MenuNode> {
    let mut stmt = conn.prepare(&format!("{MENU_SELECT_SQL} WHERE node_uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_menu_row(row);
    }
    Err(RepoError::NodeNotFound(id))
}

fn parse_menu_row(row: &Row<'_>) -> RepoResult<MenuNode> {
    let id_text: String = row.get("node_uuid")?;
    let kind_text: String = row.get("kind")?;
    let kind = MenuKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid menu kind `{kind_text}` in menu_items.kind"))
    })?;

    let level: i64 = row.get("level")?;
    let level = u32::try_from(level).map_err(|_| {
        RepoError::InvalidData(format!("invalid level `{level}` in menu_items.level"))
    })?;

    let node = MenuNode {
        id: parse_uuid(&id_text, "menu_items.node_uuid")?,
        kind,
        parent_id: parse_optional_uuid(row.get("parent_uuid")?, "menu_items.parent_uuid")?,
        title: row.get("title")?,
        level,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    node.validate()
        .map_err(|err| RepoError::InvalidData(format!("menu {}: {err}", node.id)))?;
    Ok(node)
}
