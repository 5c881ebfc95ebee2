//! Persistence collaborator contracts and SQLite implementations.
//!
//! # Responsibility
//! - Map `MenuNode` / `Member` records onto the `menuItems` and `teamMembers`
//!   collections (tables `menu_items`, `team_members`).
//! - Offer create, partial update, delete, get and ordered query primitives.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Write paths validate record shape before SQL mutations.
//! - Ordered queries are deterministic: `sort_order ASC, <uuid> ASC`.
//! - Missing targets are reported as semantic `*NotFound` errors.

use crate::db::DbError;
use crate::model::member::MemberId;
use crate::model::menu::MenuId;
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod member_repo;
pub mod menu_repo;
mod schema;

/// Result type used by repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Document collections owned by the hierarchy core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    MenuItems,
    TeamMembers,
}

impl Collection {
    /// Collection name used by external document-store clients.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MenuItems => "menuItems",
            Self::TeamMembers => "teamMembers",
        }
    }

    /// Backing SQLite table.
    pub fn table(self) -> &'static str {
        match self {
            Self::MenuItems => "menu_items",
            Self::TeamMembers => "team_members",
        }
    }
}

/// Storage-level failure from create/update/delete/query.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Record shape rejected before write.
    Validation(ValidationError),
    /// Target menu node does not exist.
    NodeNotFound(MenuId),
    /// Target member does not exist.
    MemberNotFound(MemberId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NodeNotFound(id) => write!(f, "menu node not found: {id}"),
            Self::MemberNotFound(id) => write!(f, "team member not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Collection;

    #[test]
    fn collection_names_match_document_store_layout() {
        assert_eq!(Collection::MenuItems.as_str(), "menuItems");
        assert_eq!(Collection::TeamMembers.as_str(), "teamMembers");
        assert_eq!(Collection::TeamMembers.table(), "team_members");
    }
}
