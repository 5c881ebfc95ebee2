//! Team member domain model.
//!
//! # Invariants
//! - A member belongs to exactly one menu (`menu_id`).
//! - `order` is a 1-based rank among members of the same menu.

use super::menu::MenuId;
use super::validation::{normalize_member_name, normalize_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable member identifier.
pub type MemberId = Uuid;

/// Member record as stored in the `teamMembers` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub menu_id: MenuId,
    pub name: String,
    /// Role shown under the name.
    pub designation: String,
    pub location: String,
    /// Blob storage path of the portrait, if any.
    pub image_ref: Option<String>,
    pub order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Editable member fields supplied by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDraft {
    pub name: String,
    pub designation: String,
    pub location: String,
    pub image_ref: Option<String>,
}

impl MemberDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn designation(mut self, value: impl Into<String>) -> Self {
        self.designation = value.into();
        self
    }

    pub fn location(mut self, value: impl Into<String>) -> Self {
        self.location = value.into();
        self
    }

    pub fn image_ref(mut self, value: impl Into<String>) -> Self {
        self.image_ref = Some(value.into());
        self
    }

    /// Returns a copy with normalized text; blank image refs become `None`.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: normalize_member_name(&self.name)?,
            designation: normalize_text(&self.designation),
            location: normalize_text(&self.location),
            image_ref: self
                .image_ref
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        })
    }
}

/// Insert payload; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub menu_id: MenuId,
    pub draft: MemberDraft,
    pub order: i64,
}

/// Partial update. `image_ref: Some(None)` clears the image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub designation: Option<String>,
    pub location: Option<String>,
    pub image_ref: Option<Option<String>>,
    pub menu_id: Option<MenuId>,
    pub order: Option<i64>,
}

impl MemberPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.designation.is_none()
            && self.location.is_none()
            && self.image_ref.is_none()
            && self.menu_id.is_none()
            && self.order.is_none()
    }

    /// Full replacement of the editable fields.
    pub fn from_draft(draft: MemberDraft) -> Self {
        Self {
            name: Some(draft.name),
            designation: Some(draft.designation),
            location: Some(draft.location),
            image_ref: Some(draft.image_ref),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MemberDraft, MemberPatch};
    use crate::model::validation::ValidationError;

    #[test]
    fn normalized_draft_trims_fields_and_drops_blank_image() {
        let draft = MemberDraft::new("  Ada   Lovelace ")
            .designation(" Coordinator ")
            .location("North")
            .image_ref("   ");
        let normalized = draft.normalized().unwrap();
        assert_eq!(normalized.name, "Ada Lovelace");
        assert_eq!(normalized.designation, "Coordinator");
        assert_eq!(normalized.image_ref, None);
    }

    #[test]
    fn normalized_draft_requires_name() {
        assert_eq!(
            MemberDraft::new(" ").normalized(),
            Err(ValidationError::BlankMemberName)
        );
    }

    #[test]
    fn patch_from_draft_is_not_empty() {
        assert!(MemberPatch::default().is_empty());
        assert!(!MemberPatch::from_draft(MemberDraft::new("x")).is_empty());
    }
}
