//! Checklist item definitions and the per-item result state of a session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InspectionError;
use crate::photos::PhotoRef;
use crate::schedule::ControlInterval;

/// Default upper bound on photos attached to one checklist item.
pub const DEFAULT_MAX_PHOTOS_PER_ITEM: usize = 6;

/// Identifier of a checklist item, unique within its master control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Importance of a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Template entry describing one thing to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemDefinition {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub instructions: String,
    pub interval: ControlInterval,
    #[serde(default)]
    pub buffer_days: u32,
}

/// Outcome recorded for a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Unset,
    Approved,
    NotApproved,
}

impl ItemStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unset => "Unset",
            Self::Approved => "Approved",
            Self::NotApproved => "Not Approved",
        }
    }
}

/// An item is resolved when approved, or not approved with explanatory notes.
pub fn is_resolved(status: ItemStatus, notes: &str) -> bool {
    match status {
        ItemStatus::Approved => true,
        ItemStatus::NotApproved => !notes.trim().is_empty(),
        ItemStatus::Unset => false,
    }
}

/// Per-session state of one checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemResult {
    pub item_id: ItemId,
    pub name: String,
    pub priority: Priority,
    pub instructions: String,
    pub status: ItemStatus,
    pub notes: String,
    pub photo_refs: Vec<PhotoRef>,
}

impl ChecklistItemResult {
    /// Fresh, unset result copied from a template definition.
    pub fn from_definition(def: &ChecklistItemDefinition) -> Self {
        Self {
            item_id: def.id.clone(),
            name: def.name.clone(),
            priority: def.priority,
            instructions: def.instructions.clone(),
            status: ItemStatus::Unset,
            notes: String::new(),
            photo_refs: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        is_resolved(self.status, &self.notes)
    }

    /// Not approved but still missing notes.
    pub fn needs_notes(&self) -> bool {
        self.status == ItemStatus::NotApproved && self.notes.trim().is_empty()
    }

    /// Whether one more photo would exceed `max`.
    pub fn photo_slots_full(&self, max: usize) -> bool {
        self.photo_refs.len() >= max
    }

    pub fn add_photo(&mut self, photo: PhotoRef, max: usize) -> Result<(), InspectionError> {
        if self.photo_slots_full(max) {
            return Err(InspectionError::PhotoLimitReached {
                item_id: self.item_id.clone(),
                max,
            });
        }
        self.photo_refs.push(photo);
        Ok(())
    }

    /// Remove a photo reference. Returns `false` if it was not attached.
    pub fn remove_photo(&mut self, photo: &PhotoRef) -> bool {
        let before = self.photo_refs.len();
        self.photo_refs.retain(|p| p != photo);
        self.photo_refs.len() != before
    }
}
