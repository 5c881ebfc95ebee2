//! Team directory export.
//!
//! Produces a nested JSON document of menus and their ordered members, the
//! shape handed to the dashboard's "export" action.

use crate::model::forest::MenuForest;
use crate::model::member::{Member, MemberId};
use crate::model::menu::{MenuId, MenuKind, MenuNode};
use serde::Serialize;
use std::collections::HashSet;

/// Export format version.
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryExport {
    pub version: u32,
    pub menu_count: usize,
    pub member_count: usize,
    pub menus: Vec<MenuExport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuExport {
    pub id: MenuId,
    pub title: String,
    pub kind: MenuKind,
    pub level: u32,
    pub order: i64,
    pub members: Vec<MemberExport>,
    pub children: Vec<MenuExport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberExport {
    pub id: MemberId,
    pub name: String,
    pub designation: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub order: i64,
}

impl From<&Member> for MemberExport {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            name: member.name.clone(),
            designation: member.designation.clone(),
            location: member.location.clone(),
            image_ref: member.image_ref.clone(),
            order: member.order,
        }
    }
}

/// Builds the nested export from a forest snapshot.
pub fn directory_export(forest: &MenuForest) -> DirectoryExport {
    let mut visited = HashSet::new();
    let menus = forest
        .roots()
        .into_iter()
        .filter_map(|root| export_node(forest, root, &mut visited))
        .collect();
    DirectoryExport {
        version: EXPORT_VERSION,
        menu_count: forest.len(),
        member_count: forest.member_count(),
        menus,
    }
}

/// Pretty-printed JSON export.
pub fn directory_json(forest: &MenuForest) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&directory_export(forest))
}

fn export_node(
    forest: &MenuForest,
    node: &MenuNode,
    visited: &mut HashSet<MenuId>,
) -> Option<MenuExport> {
    if !visited.insert(node.id) {
        return None;
    }
    let children = forest
        .children(Some(node.id))
        .into_iter()
        .filter_map(|child| export_node(forest, child, visited))
        .collect();
    Some(MenuExport {
        id: node.id,
        title: node.title.clone(),
        kind: node.kind,
        level: node.level,
        order: node.order,
        members: forest.members(node.id).iter().map(MemberExport::from).collect(),
        children,
    })
}
