//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into hierarchy-level operations.
//! - Keep renderers and bindings decoupled from storage details.

pub mod menu_service;
mod ordering;
