//! Boundary validation for menu and member records.
//!
//! # Invariants
//! - Titles and names are trimmed and inner whitespace is collapsed before
//!   comparison or persistence.
//! - Sibling title comparison is case-insensitive.

use super::menu::MenuId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Highest rank a menu or member may hold.
pub const MAX_ORDER: i64 = i32::MAX as i64;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Rejected input, reported before any write reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Menu title is blank after trim.
    BlankTitle,
    /// Another sibling under the same parent already uses this title.
    DuplicateSiblingTitle {
        parent_id: Option<MenuId>,
        title: String,
    },
    /// Submenu created without a parent.
    MissingParent,
    /// Main menu created with a parent.
    UnexpectedParent(MenuId),
    /// Member name is blank after trim.
    BlankMemberName,
    /// Order rank outside `1..=MAX_ORDER`.
    InvalidOrder(i64),
    /// Persisted level does not match the node kind.
    InvalidLevel { kind: &'static str, level: u32 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "menu title must not be blank"),
            Self::DuplicateSiblingTitle { parent_id, title } => match parent_id {
                Some(parent_id) => write!(
                    f,
                    "menu title `{title}` already exists under parent {parent_id}"
                ),
                None => write!(f, "main menu title `{title}` already exists"),
            },
            Self::MissingParent => write!(f, "submenu requires a parent menu"),
            Self::UnexpectedParent(parent_id) => {
                write!(f, "main menu must not have a parent (got {parent_id})")
            }
            Self::BlankMemberName => write!(f, "member name must not be blank"),
            Self::InvalidOrder(order) => {
                write!(f, "order must be between 1 and {MAX_ORDER}, got {order}")
            }
            Self::InvalidLevel { kind, level } => {
                write!(f, "level {level} is not valid for {kind} menu")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims and collapses whitespace; rejects blank titles.
pub fn normalize_title(value: &str) -> Result<String, ValidationError> {
    let collapsed = collapse_whitespace(value);
    if collapsed.is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    Ok(collapsed)
}

/// Trims and collapses whitespace; rejects blank names.
pub fn normalize_member_name(value: &str) -> Result<String, ValidationError> {
    let collapsed = collapse_whitespace(value);
    if collapsed.is_empty() {
        return Err(ValidationError::BlankMemberName);
    }
    Ok(collapsed)
}

/// Normalizes optional free-text fields. Blank becomes empty.
pub fn normalize_text(value: &str) -> String {
    collapse_whitespace(value)
}

/// Case-insensitive title equality used for sibling uniqueness.
pub fn titles_collide(left: &str, right: &str) -> bool {
    title_key(left) == title_key(right)
}

pub(crate) fn ensure_order(order: i64) -> Result<i64, ValidationError> {
    if !(1..=MAX_ORDER).contains(&order) {
        return Err(ValidationError::InvalidOrder(order));
    }
    Ok(order)
}

fn title_key(value: &str) -> String {
    collapse_whitespace(value).to_lowercase()
}

fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}
