//! Domain model for the team directory hierarchy.
//!
//! # Responsibility
//! - Define explicit record types for menu nodes and team members.
//! - Validate required fields at the boundary before persistence.
//! - Provide the grouped forest read model consumed by renderers.
//!
//! # Invariants
//! - The parent relation forms a forest; every submenu chain ends at a main menu.
//! - Every member references exactly one existing menu node.

pub mod forest;
pub mod member;
pub mod menu;
pub mod validation;
