//! Menu node domain model.
//!
//! # Invariants
//! - `Main` nodes have no parent and `level == 0`.
//! - `Sub` nodes have a parent and `level >= 1`.
//! - `order` is a 1-based rank among siblings; siblings never share a rank.

use super::validation::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable menu node identifier.
pub type MenuId = Uuid;

/// Position of a node in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    /// Top-level, parentless menu.
    Main,
    /// Nested menu owned by another node.
    Sub,
}

impl MenuKind {
    /// Storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Sub => "sub",
        }
    }

    /// Parses a storage/wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "main" => Some(Self::Main),
            "sub" => Some(Self::Sub),
            _ => None,
        }
    }
}

/// Sibling move direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards lower `order`.
    Up,
    /// Towards higher `order`.
    Down,
}

/// Menu node record as stored in the `menuItems` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    pub id: MenuId,
    pub kind: MenuKind,
    /// `None` for main menus.
    pub parent_id: Option<MenuId>,
    pub title: String,
    /// Depth from the owning main menu; fixed at insert.
    pub level: u32,
    /// 1-based rank among siblings.
    pub order: i64,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

impl MenuNode {
    pub fn is_main(&self) -> bool {
        self.kind == MenuKind::Main
    }

    /// Checks structural invariants of one record in isolation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        match (self.kind, self.parent_id) {
            (MenuKind::Main, Some(parent_id)) => {
                return Err(ValidationError::UnexpectedParent(parent_id))
            }
            (MenuKind::Sub, None) => return Err(ValidationError::MissingParent),
            _ => {}
        }
        let level_ok = match self.kind {
            MenuKind::Main => self.level == 0,
            MenuKind::Sub => self.level >= 1,
        };
        if !level_ok {
            return Err(ValidationError::InvalidLevel {
                kind: self.kind.as_str(),
                level: self.level,
            });
        }
        if self.order < 1 {
            return Err(ValidationError::InvalidOrder(self.order));
        }
        Ok(())
    }
}

/// Insert payload; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMenuNode {
    pub kind: MenuKind,
    pub parent_id: Option<MenuId>,
    pub title: String,
    pub level: u32,
    pub order: i64,
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuPatch {
    pub title: Option<String>,
    pub order: Option<i64>,
}

impl MenuPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.order.is_none()
    }
}
