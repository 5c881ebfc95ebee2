//! Read model over the full menu forest.
//!
//! # Responsibility
//! - Group flat node/member lists by parent for recursive rendering.
//! - Answer hierarchy queries (descendants, sibling neighbours, paths)
//!   without touching storage.
//!
//! # Invariants
//! - Children and members are ordered by `order ASC, id ASC`.
//! - Traversals terminate even on malformed (cyclic) input.

use super::member::{Member, MemberId};
use super::menu::{Direction, MenuId, MenuNode};
use std::collections::{HashMap, HashSet};

/// One rendered row of the nested, expandable tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow<'a> {
    /// 0 for main menus.
    pub depth: usize,
    pub node: &'a MenuNode,
    pub has_children: bool,
    pub member_count: usize,
    /// Up-button state for the row.
    pub is_first: bool,
    /// Down-button state for the row.
    pub is_last: bool,
}

/// Immutable snapshot of all menus and their members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuForest {
    nodes: HashMap<MenuId, MenuNode>,
    children: HashMap<Option<MenuId>, Vec<MenuId>>,
    members: HashMap<MenuId, Vec<Member>>,
}

impl MenuForest {
    /// Flattens then groups records by parent.
    pub fn build(nodes: Vec<MenuNode>, members: Vec<Member>) -> Self {
        let mut children: HashMap<Option<MenuId>, Vec<(i64, MenuId)>> = HashMap::new();
        for node in &nodes {
            children
                .entry(node.parent_id)
                .or_default()
                .push((node.order, node.id));
        }
        let children: HashMap<Option<MenuId>, Vec<MenuId>> = children
            .into_iter()
            .map(|(parent, mut ranked)| {
                ranked.sort();
                (parent, ranked.into_iter().map(|(_, id)| id).collect())
            })
            .collect();

        let mut grouped: HashMap<MenuId, Vec<Member>> = HashMap::new();
        for member in members {
            grouped.entry(member.menu_id).or_default().push(member);
        }
        for list in grouped.values_mut() {
            list.sort_by(|left, right| (left.order, left.id).cmp(&(right.order, right.id)));
        }

        Self {
            nodes: nodes.into_iter().map(|node| (node.id, node)).collect(),
            children,
            members: grouped,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: MenuId) -> Option<&MenuNode> {
        self.nodes.get(&id)
    }

    /// Main menus in display order.
    pub fn roots(&self) -> Vec<&MenuNode> {
        self.children(None)
    }

    /// Direct children of `parent` (`None` = main menus) in display order.
    pub fn children(&self, parent: Option<MenuId>) -> Vec<&MenuNode> {
        self.children
            .get(&parent)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    /// Members directly assigned to `menu_id`, in display order.
    pub fn members(&self, menu_id: MenuId) -> &[Member] {
        self.members
            .get(&menu_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn member_ids(&self, menu_id: MenuId) -> Vec<MemberId> {
        self.members(menu_id).iter().map(|member| member.id).collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    /// `id` followed by all transitive children in pre-order.
    ///
    /// Returns an empty list for unknown ids.
    pub fn descendants(&self, id: MenuId) -> Vec<MenuId> {
        if !self.nodes.contains_key(&id) {
            return Vec::new();
        }
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            result.push(current);
            if let Some(children) = self.children.get(&Some(current)) {
                stack.extend(children.iter().rev().copied());
            }
        }
        result
    }

    /// Adjacent sibling of `id` in `direction`, or `None` at the boundary.
    pub fn neighbour(&self, id: MenuId, direction: Direction) -> Option<&MenuNode> {
        let node = self.nodes.get(&id)?;
        let siblings = self.children.get(&node.parent_id)?;
        let index = siblings.iter().position(|candidate| *candidate == id)?;
        let target = match direction {
            Direction::Up => index.checked_sub(1)?,
            Direction::Down => index + 1,
        };
        siblings.get(target).and_then(|sibling| self.nodes.get(sibling))
    }

    /// Titles from the main menu down to `id`.
    pub fn path(&self, id: MenuId) -> Vec<&str> {
        let mut titles = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = self.nodes.get(&id);
        while let Some(node) = cursor {
            if !visited.insert(node.id) {
                break;
            }
            titles.push(node.title.as_str());
            cursor = node.parent_id.and_then(|parent| self.nodes.get(&parent));
        }
        titles.reverse();
        titles
    }

    /// Depth-first rows for nested rendering.
    pub fn rows(&self) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        self.push_rows(None, 0, &mut visited, &mut rows);
        rows
    }

    fn push_rows<'a>(
        &'a self,
        parent: Option<MenuId>,
        depth: usize,
        visited: &mut HashSet<MenuId>,
        rows: &mut Vec<TreeRow<'a>>,
    ) {
        let siblings = self.children(parent);
        let last_index = siblings.len().saturating_sub(1);
        for (index, node) in siblings.into_iter().enumerate() {
            if !visited.insert(node.id) {
                continue;
            }
            rows.push(TreeRow {
                depth,
                node,
                has_children: self
                    .children
                    .get(&Some(node.id))
                    .is_some_and(|ids| !ids.is_empty()),
                member_count: self.members(node.id).len(),
                is_first: index == 0,
                is_last: index == last_index,
            });
            self.push_rows(Some(node.id), depth + 1, visited, rows);
        }
    }
}
