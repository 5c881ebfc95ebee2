//! Menu hierarchy use-case service.
//!
//! # Responsibility
//! - Validate hierarchy invariants above the repository layer.
//! - Provide insert, rename, reorder and cascade-delete for menu nodes, and
//!   assign/edit/reorder/unassign for members.
//! - Maintain the lazily rebuilt forest read model and publish snapshots.
//!
//! # Invariants
//! - Sibling titles are unique case-insensitively under one parent.
//! - Sibling ranks stay unique after every add, reorder, move and delete.
//! - Validation failures are reported before any write.
//! - Cascade deletes remove members first, then nodes deepest first, and
//!   publish a single snapshot once finished.

use crate::blob::BlobStore;
use crate::feed::{ForestSnapshot, SnapshotFeed};
use crate::model::forest::MenuForest;
use crate::model::member::{Member, MemberDraft, MemberId, MemberPatch, NewMember};
use crate::model::menu::{Direction, MenuId, MenuKind, MenuNode, MenuPatch, NewMenuNode};
use crate::model::validation::{ensure_order, normalize_title, titles_collide, ValidationError};
use crate::repo::member_repo::{MemberFilter, MemberRepository};
use crate::repo::menu_repo::{MenuFilter, MenuRepository};
use crate::repo::RepoError;
use crate::service::ordering::{next_order, reorder_changes, swap_changes};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// Record touched by a cascade delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeTarget {
    Member(MemberId),
    Node(MenuId),
}

impl Display for CascadeTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member(id) => write!(f, "member {id}"),
            Self::Node(id) => write!(f, "menu {id}"),
        }
    }
}

/// One record the cascade could not remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeItemFailure {
    pub target: CascadeTarget,
    pub message: String,
}

/// What a cascade delete removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub deleted_members: Vec<MemberId>,
    /// Deepest first.
    pub deleted_nodes: Vec<MenuId>,
    /// Blob paths cleaned up after their members were removed.
    pub removed_blobs: Vec<String>,
}

/// Cascade delete that stopped short of removing everything.
///
/// Completed deletions are not rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeFailure {
    pub root: MenuId,
    pub report: CascadeReport,
    pub failures: Vec<CascadeItemFailure>,
}

impl CascadeFailure {
    pub fn failed_targets(&self) -> Vec<CascadeTarget> {
        self.failures.iter().map(|failure| failure.target).collect()
    }
}

/// Errors from menu service operations.
#[derive(Debug)]
pub enum MenuServiceError {
    /// Input rejected before any write.
    Validation(ValidationError),
    /// Target node does not exist.
    NodeNotFound(MenuId),
    /// Parent node for a submenu does not exist.
    ParentNotFound(MenuId),
    /// Target member does not exist.
    MemberNotFound(MemberId),
    /// Store failure during create/update/delete/query.
    Repo(RepoError),
    /// Some records of a cascade delete could not be removed.
    PartialCascade(CascadeFailure),
}

impl Display for MenuServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NodeNotFound(id) => write!(f, "menu node not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent menu not found: {id}"),
            Self::MemberNotFound(id) => write!(f, "team member not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::PartialCascade(failure) => write!(
                f,
                "delete of menu {} incomplete: {} record(s) failed, {} menu(s) and {} member(s) removed",
                failure.root,
                failure.failures.len(),
                failure.report.deleted_nodes.len(),
                failure.report.deleted_members.len()
            ),
        }
    }
}

impl Error for MenuServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for MenuServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for MenuServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NodeNotFound(id) => Self::NodeNotFound(id),
            RepoError::MemberNotFound(id) => Self::MemberNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type MenuServiceResult<T> = Result<T, MenuServiceError>;

/// Menu hierarchy manager over menu and member repositories.
pub struct MenuService<M: MenuRepository, P: MemberRepository> {
    menus: M,
    members: P,
    blobs: Option<Box<dyn BlobStore>>,
    feed: SnapshotFeed,
    forest: RefCell<Option<Arc<MenuForest>>>,
}

impl<M: MenuRepository, P: MemberRepository> MenuService<M, P> {
    /// Creates service from repository implementations.
    pub fn new(menus: M, members: P) -> Self {
        Self {
            menus,
            members,
            blobs: None,
            feed: SnapshotFeed::new(),
            forest: RefCell::new(None),
        }
    }

    /// Enables best-effort image cleanup when members are removed.
    pub fn with_blob_store(mut self, store: impl BlobStore + 'static) -> Self {
        self.blobs = Some(Box::new(store));
        self
    }

    /// Adds a main menu (`parent_id = None`) or submenu.
    pub fn add_node(
        &self,
        title: &str,
        kind: MenuKind,
        parent_id: Option<MenuId>,
    ) -> MenuServiceResult<MenuNode> {
        let title = normalize_title(title)?;
        let level = match (kind, parent_id) {
            (MenuKind::Main, Some(parent_id)) => {
                return Err(ValidationError::UnexpectedParent(parent_id).into())
            }
            (MenuKind::Sub, None) => return Err(ValidationError::MissingParent.into()),
            (MenuKind::Main, None) => 0,
            (MenuKind::Sub, Some(parent_id)) => {
                let parent = self
                    .menus
                    .get_node(parent_id)?
                    .ok_or(MenuServiceError::ParentNotFound(parent_id))?;
                parent.level + 1
            }
        };

        let siblings = self.menus.list_nodes(MenuFilter::siblings(parent_id))?;
        ensure_unique_title(&siblings, &title, parent_id, None)?;

        let node = self.menus.create_node(&NewMenuNode {
            kind,
            parent_id,
            title,
            level,
            order: next_order(siblings.iter().map(|sibling| sibling.order))?,
        })?;
        debug!(
            "event=menu_add module=service status=ok kind={} level={} order={}",
            node.kind.as_str(),
            node.level,
            node.order
        );
        self.after_write();
        Ok(node)
    }

    /// Renames one node; children are untouched.
    pub fn rename_node(&self, id: MenuId, new_title: &str) -> MenuServiceResult<MenuNode> {
        let title = normalize_title(new_title)?;
        let node = self.require_node(id)?;
        let siblings = self.menus.list_nodes(MenuFilter::siblings(node.parent_id))?;
        ensure_unique_title(&siblings, &title, node.parent_id, Some(id))?;

        let updated = self.menus.update_node(
            id,
            &MenuPatch {
                title: Some(title),
                order: None,
            },
        )?;
        self.after_write();
        Ok(updated)
    }

    /// Sets a node's rank; a sibling holding `new_order` takes the old rank.
    pub fn reorder_node(&self, id: MenuId, new_order: i64) -> MenuServiceResult<MenuNode> {
        let new_order = ensure_order(new_order)?;
        let node = self.require_node(id)?;
        let ranked = ranked_nodes(&self.menus.list_nodes(MenuFilter::siblings(node.parent_id))?);

        let changes = reorder_changes(id, node.order, new_order, &ranked);
        if changes.is_empty() {
            return Ok(node);
        }
        self.menus.update_orders(&changes)?;
        self.after_write();
        self.require_node(id)
    }

    /// Swaps a node with its adjacent sibling.
    ///
    /// Returns `false` without writing at the first/last position.
    pub fn move_sibling(&self, id: MenuId, direction: Direction) -> MenuServiceResult<bool> {
        let node = self.require_node(id)?;
        let ranked = ranked_nodes(&self.menus.list_nodes(MenuFilter::siblings(node.parent_id))?);

        let changes = swap_changes(id, direction, &ranked);
        if changes.is_empty() {
            return Ok(false);
        }
        self.menus.update_orders(&changes)?;
        self.after_write();
        Ok(true)
    }

    /// Deletes a node, its descendants and every member assigned to them.
    ///
    /// Members go first, then nodes deepest first. Individual failures do not
    /// abort the sequence; a node is skipped when one of its members or
    /// children could not be removed. Any failure is returned as
    /// `PartialCascade` with the completed part of the work.
    pub fn delete_node(&self, id: MenuId) -> MenuServiceResult<CascadeReport> {
        let started_at = Instant::now();
        self.require_node(id)?;

        let forest = self.load_forest()?;
        let affected = forest.descendants(id);
        let doomed_members = self
            .members
            .list_members(&MemberFilter::InMenus(affected.clone()))?;

        let mut doomed_nodes: Vec<&MenuNode> = affected
            .iter()
            .rev()
            .filter_map(|node_id| forest.get(*node_id))
            .collect();
        doomed_nodes.sort_by_key(|node| Reverse(node.level));

        let mut report = CascadeReport::default();
        let mut failures = Vec::new();
        let mut blocked: HashSet<MenuId> = HashSet::new();

        for member in &doomed_members {
            match self.members.delete_member(member.id) {
                Ok(()) => {
                    report.deleted_members.push(member.id);
                    if let Some(path) = member.image_ref.as_deref() {
                        if self.remove_blob(path) {
                            report.removed_blobs.push(path.to_string());
                        }
                    }
                }
                Err(err) => {
                    blocked.insert(member.menu_id);
                    failures.push(CascadeItemFailure {
                        target: CascadeTarget::Member(member.id),
                        message: err.to_string(),
                    });
                }
            }
        }

        for node in doomed_nodes {
            let outcome = if blocked.contains(&node.id) {
                Err("skipped: a member or child menu could not be deleted".to_string())
            } else {
                self.menus.delete_node(node.id).map_err(|err| err.to_string())
            };
            match outcome {
                Ok(()) => report.deleted_nodes.push(node.id),
                Err(message) => {
                    if let Some(parent_id) = node.parent_id {
                        blocked.insert(parent_id);
                    }
                    failures.push(CascadeItemFailure {
                        target: CascadeTarget::Node(node.id),
                        message,
                    });
                }
            }
        }

        if !report.deleted_nodes.is_empty() || !report.deleted_members.is_empty() {
            self.after_write();
        }

        if failures.is_empty() {
            info!(
                "event=menu_delete module=service status=ok nodes={} members={} blobs={} duration_ms={}",
                report.deleted_nodes.len(),
                report.deleted_members.len(),
                report.removed_blobs.len(),
                started_at.elapsed().as_millis()
            );
            return Ok(report);
        }

        warn!(
            "event=menu_delete module=service status=partial nodes={} members={} failed={} duration_ms={}",
            report.deleted_nodes.len(),
            report.deleted_members.len(),
            failures.len(),
            started_at.elapsed().as_millis()
        );
        Err(MenuServiceError::PartialCascade(CascadeFailure {
            root: id,
            report,
            failures,
        }))
    }

    /// Creates a member at the end of `menu_id`'s member list.
    pub fn assign_member(&self, menu_id: MenuId, draft: &MemberDraft) -> MenuServiceResult<Member> {
        let draft = draft.normalized()?;
        self.require_node(menu_id)?;
        let existing = self.members.list_members(&MemberFilter::InMenu(menu_id))?;

        let member = self.members.create_member(&NewMember {
            menu_id,
            draft,
            order: next_order(existing.iter().map(|member| member.order))?,
        })?;
        debug!(
            "event=member_assign module=service status=ok order={}",
            member.order
        );
        self.after_write();
        Ok(member)
    }

    /// Replaces a member's editable fields.
    ///
    /// A replaced image is removed from blob storage best-effort.
    pub fn update_member(&self, id: MemberId, draft: &MemberDraft) -> MenuServiceResult<Member> {
        let draft = draft.normalized()?;
        let current = self.require_member(id)?;

        let updated = self
            .members
            .update_member(id, &MemberPatch::from_draft(draft))?;
        if let Some(previous) = current.image_ref.as_deref() {
            if updated.image_ref.as_deref() != Some(previous) {
                self.remove_blob(previous);
            }
        }
        self.after_write();
        Ok(updated)
    }

    /// Moves a member to the end of another menu's member list.
    pub fn reassign_member(&self, id: MemberId, menu_id: MenuId) -> MenuServiceResult<Member> {
        let current = self.require_member(id)?;
        self.require_node(menu_id)?;
        if current.menu_id == menu_id {
            return Ok(current);
        }

        let target = self.members.list_members(&MemberFilter::InMenu(menu_id))?;
        let updated = self.members.update_member(
            id,
            &MemberPatch {
                menu_id: Some(menu_id),
                order: Some(next_order(target.iter().map(|member| member.order))?),
                ..MemberPatch::default()
            },
        )?;
        self.after_write();
        Ok(updated)
    }

    /// Removes a member from its menu; returns the removed record.
    pub fn unassign_member(&self, id: MemberId) -> MenuServiceResult<Member> {
        let member = self.require_member(id)?;
        self.members.delete_member(id)?;
        if let Some(path) = member.image_ref.as_deref() {
            self.remove_blob(path);
        }
        self.after_write();
        Ok(member)
    }

    /// Sets a member's rank; a member holding `new_order` takes the old rank.
    pub fn reorder_member(&self, id: MemberId, new_order: i64) -> MenuServiceResult<Member> {
        let new_order = ensure_order(new_order)?;
        let member = self.require_member(id)?;
        let ranked = ranked_members(
            &self
                .members
                .list_members(&MemberFilter::InMenu(member.menu_id))?,
        );

        let changes = reorder_changes(id, member.order, new_order, &ranked);
        if changes.is_empty() {
            return Ok(member);
        }
        self.members.update_orders(&changes)?;
        self.after_write();
        self.require_member(id)
    }

    /// Swaps a member with its neighbour; `false` at the boundary.
    pub fn move_member(&self, id: MemberId, direction: Direction) -> MenuServiceResult<bool> {
        let member = self.require_member(id)?;
        let ranked = ranked_members(
            &self
                .members
                .list_members(&MemberFilter::InMenu(member.menu_id))?,
        );

        let changes = swap_changes(id, direction, &ranked);
        if changes.is_empty() {
            return Ok(false);
        }
        self.members.update_orders(&changes)?;
        self.after_write();
        Ok(true)
    }

    /// Loads one node; missing ids are `NodeNotFound`.
    pub fn get_node(&self, id: MenuId) -> MenuServiceResult<MenuNode> {
        self.require_node(id)
    }

    /// Loads one member; missing ids are `MemberNotFound`.
    pub fn get_member(&self, id: MemberId) -> MenuServiceResult<Member> {
        self.require_member(id)
    }

    /// Lists direct children of `parent_id` (`None` = main menus).
    pub fn list_children(&self, parent_id: Option<MenuId>) -> MenuServiceResult<Vec<MenuNode>> {
        if let Some(parent_id) = parent_id {
            self.menus
                .get_node(parent_id)?
                .ok_or(MenuServiceError::ParentNotFound(parent_id))?;
        }
        Ok(self.menus.list_nodes(MenuFilter::siblings(parent_id))?)
    }

    /// Lists members of one menu in display order.
    pub fn list_members(&self, menu_id: MenuId) -> MenuServiceResult<Vec<Member>> {
        self.require_node(menu_id)?;
        Ok(self.members.list_members(&MemberFilter::InMenu(menu_id))?)
    }

    /// Member ids directly assigned to one menu.
    pub fn member_ids(&self, menu_id: MenuId) -> MenuServiceResult<Vec<MemberId>> {
        Ok(self
            .list_members(menu_id)?
            .into_iter()
            .map(|member| member.id)
            .collect())
    }

    /// Current forest read model, rebuilt only after a write.
    pub fn forest(&self) -> MenuServiceResult<Arc<MenuForest>> {
        if let Some(cached) = self.forest.borrow().as_ref() {
            return Ok(Arc::clone(cached));
        }
        let forest = Arc::new(self.load_forest()?);
        *self.forest.borrow_mut() = Some(Arc::clone(&forest));
        Ok(forest)
    }

    /// Receives one snapshot after every successful write.
    pub fn subscribe(&self) -> broadcast::Receiver<ForestSnapshot> {
        self.feed.subscribe()
    }

    fn load_forest(&self) -> MenuServiceResult<MenuForest> {
        let nodes = self.menus.list_nodes(MenuFilter::All)?;
        let members = self.members.list_members(&MemberFilter::All)?;
        Ok(MenuForest::build(nodes, members))
    }

    fn after_write(&self) {
        self.forest.borrow_mut().take();
        if !self.feed.has_subscribers() {
            return;
        }
        match self.forest() {
            Ok(forest) => {
                let revision = self.feed.publish(forest);
                debug!("event=forest_publish module=service status=ok revision={revision}");
            }
            Err(err) => {
                warn!("event=forest_publish module=service status=error error={err}");
            }
        }
    }

    fn remove_blob(&self, path: &str) -> bool {
        let Some(store) = self.blobs.as_ref() else {
            return false;
        };
        match store.delete(path) {
            Ok(()) => true,
            Err(err) => {
                warn!("event=blob_cleanup module=service status=error error={err}");
                false
            }
        }
    }

    fn require_node(&self, id: MenuId) -> MenuServiceResult<MenuNode> {
        self.menus
            .get_node(id)?
            .ok_or(MenuServiceError::NodeNotFound(id))
    }

    fn require_member(&self, id: MemberId) -> MenuServiceResult<Member> {
        self.members
            .get_member(id)?
            .ok_or(MenuServiceError::MemberNotFound(id))
    }
}

fn ensure_unique_title(
    siblings: &[MenuNode],
    title: &str,
    parent_id: Option<MenuId>,
    exclude: Option<MenuId>,
) -> Result<(), ValidationError> {
    let duplicate = siblings
        .iter()
        .filter(|sibling| Some(sibling.id) != exclude)
        .any(|sibling| titles_collide(&sibling.title, title));
    if duplicate {
        return Err(ValidationError::DuplicateSiblingTitle {
            parent_id,
            title: title.to_string(),
        });
    }
    Ok(())
}

fn ranked_nodes(nodes: &[MenuNode]) -> Vec<(MenuId, i64)> {
    nodes.iter().map(|node| (node.id, node.order)).collect()
}

fn ranked_members(members: &[Member]) -> Vec<(MemberId, i64)> {
    members.iter().map(|member| (member.id, member.order)).collect()
}
