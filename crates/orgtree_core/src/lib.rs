//! Core domain logic for the team directory menu hierarchy.
//! This crate is the single source of truth for hierarchy invariants.

pub mod blob;
pub mod config;
pub mod db;
pub mod export;
pub mod feed;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use blob::{BlobError, BlobResult, BlobStore, FsBlobStore};
pub use config::CoreConfig;
pub use export::{directory_export, directory_json, DirectoryExport, MemberExport, MenuExport};
pub use feed::{ForestSnapshot, SnapshotFeed};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::forest::{MenuForest, TreeRow};
pub use model::member::{Member, MemberDraft, MemberId, MemberPatch, NewMember};
pub use model::menu::{Direction, MenuId, MenuKind, MenuNode, MenuPatch, NewMenuNode};
pub use model::validation::{ValidationError, MAX_ORDER};
pub use repo::member_repo::{MemberFilter, MemberRepository, SqliteMemberRepository};
pub use repo::menu_repo::{MenuFilter, MenuRepository, SqliteMenuRepository};
pub use repo::{Collection, RepoError, RepoResult};
pub use service::menu_service::{
    CascadeFailure, CascadeItemFailure, CascadeReport, CascadeTarget, MenuService,
    MenuServiceError, MenuServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
