//! The in-progress inspection session.
//!
//! A session owns an ordered list of [`ChecklistItemResult`] values addressed
//! by [`ItemId`]. The navigation cursor is kept separately and never affects
//! completeness. Once the report finalizer locks a session, every mutation
//! fails with [`InspectionError::SessionLocked`].

use serde::{Deserialize, Serialize};

use crate::checklist::{ChecklistItemDefinition, ChecklistItemResult, ItemId, ItemStatus};
use crate::error::InspectionError;
use crate::photos::PhotoRef;
use crate::types::{DbId, Timestamp};

/// The acting inspector, supplied by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspector {
    pub user_id: DbId,
    pub display_name: String,
}

/// Cursor movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Prev,
}

/// What is being inspected, where, and by whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub organization_id: DbId,
    pub control_id: DbId,
    pub control_name: String,
    pub asset_name: Option<String>,
    pub location: Option<String>,
    pub inspector: Inspector,
}

/// Changes applied to one item by [`InspectionSession::resolve_item`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub status: Option<ItemStatus>,
    pub notes: Option<String>,
    pub photo: Option<PhotoRef>,
}

/// Aggregate progress counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    /// Items whose status is not `unset`.
    pub answered: usize,
    /// Items satisfying the resolution predicate.
    pub resolved: usize,
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// A session that has been built from a template but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub context: SessionContext,
    pub items: Vec<ChecklistItemResult>,
    pub started_at: Timestamp,
}

impl SessionDraft {
    /// Build a draft with every item `unset`, in template order.
    pub fn new(
        context: SessionContext,
        definitions: &[ChecklistItemDefinition],
        started_at: Timestamp,
    ) -> Result<Self, InspectionError> {
        if definitions.is_empty() {
            return Err(InspectionError::EmptyChecklist);
        }
        Ok(Self {
            context,
            items: definitions
                .iter()
                .map(ChecklistItemResult::from_definition)
                .collect(),
            started_at,
        })
    }

    /// Assign the persisted identifier, producing an editable session.
    pub fn into_session(self, id: DbId) -> InspectionSession {
        InspectionSession {
            id,
            context: self.context,
            items: self.items,
            cursor: 0,
            locked: false,
            started_at: self.started_at,
            version: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Persisted fields of a session, used to rebuild one from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParts {
    pub id: DbId,
    pub context: SessionContext,
    pub items: Vec<ChecklistItemResult>,
    pub cursor: usize,
    pub locked: bool,
    pub started_at: Timestamp,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionSession {
    id: DbId,
    context: SessionContext,
    items: Vec<ChecklistItemResult>,
    cursor: usize,
    locked: bool,
    started_at: Timestamp,
    version: i64,
}

impl InspectionSession {
    /// Rebuild a session from storage.
    pub fn restore(parts: SessionParts) -> Result<Self, InspectionError> {
        if parts.items.is_empty() {
            return Err(InspectionError::EmptyChecklist);
        }
        let cursor = parts.cursor.min(parts.items.len() - 1);
        Ok(Self {
            id: parts.id,
            context: parts.context,
            items: parts.items,
            cursor,
            locked: parts.locked,
            started_at: parts.started_at,
            version: parts.version,
        })
    }

    pub fn id(&self) -> DbId {
        self.id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn inspector(&self) -> &Inspector {
        &self.context.inspector
    }

    pub fn items(&self) -> &[ChecklistItemResult] {
        &self.items
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&ChecklistItemResult> {
        self.items.iter().find(|i| &i.item_id == item_id)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_item(&self) -> &ChecklistItemResult {
        &self.items[self.cursor]
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Version last read from or written to the store.
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    /// Move the cursor, clamping at both ends. Returns the new position.
    pub fn advance(&mut self, direction: Direction) -> usize {
        self.cursor = match direction {
            Direction::Next => (self.cursor + 1).min(self.items.len() - 1),
            Direction::Prev => self.cursor.saturating_sub(1),
        };
        self.cursor
    }

    /// Apply status, notes and an optional photo to one item.
    ///
    /// Either the whole update applies or nothing changes: the photo bound is
    /// checked before any field is written.
    pub fn resolve_item(
        &mut self,
        item_id: &ItemId,
        update: ItemUpdate,
        max_photos: usize,
    ) -> Result<&ChecklistItemResult, InspectionError> {
        let item = self.item_mut(item_id)?;
        if update.photo.is_some() && item.photo_slots_full(max_photos) {
            return Err(InspectionError::PhotoLimitReached {
                item_id: item_id.clone(),
                max: max_photos,
            });
        }
        if let Some(status) = update.status {
            item.status = status;
        }
        if let Some(notes) = update.notes {
            item.notes = notes;
        }
        if let Some(photo) = update.photo {
            item.add_photo(photo, max_photos)?;
        }
        Ok(item)
    }

    /// Detach a photo. Returns `false` if the item did not reference it.
    pub fn remove_photo(
        &mut self,
        item_id: &ItemId,
        photo: &PhotoRef,
    ) -> Result<bool, InspectionError> {
        Ok(self.item_mut(item_id)?.remove_photo(photo))
    }

    pub fn is_complete(&self) -> bool {
        self.items.iter().all(ChecklistItemResult::is_resolved)
    }

    /// Ids of items that still block finalization, in checklist order.
    pub fn unresolved_item_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|i| !i.is_resolved())
            .map(|i| i.item_id.clone())
            .collect()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            total: self.items.len(),
            answered: self
                .items
                .iter()
                .filter(|i| i.status != ItemStatus::Unset)
                .count(),
            resolved: self.items.iter().filter(|i| i.is_resolved()).count(),
        }
    }

    pub(crate) fn ensure_unlocked(&self) -> Result<(), InspectionError> {
        if self.locked {
            Err(InspectionError::SessionLocked {
                session_id: self.id,
            })
        } else {
            Ok(())
        }
    }

    pub(crate) fn lock(&mut self) {
        self.locked = true;
    }

    fn item_mut(&mut self, item_id: &ItemId) -> Result<&mut ChecklistItemResult, InspectionError> {
        self.ensure_unlocked()?;
        self.items
            .iter_mut()
            .find(|i| &i.item_id == item_id)
            .ok_or_else(|| InspectionError::UnknownItem(item_id.clone()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::checklist::Priority;
    use crate::schedule::ControlInterval;

    pub(crate) fn context() -> SessionContext {
        SessionContext {
            organization_id: 1,
            control_id: 10,
            control_name: "Fire Extinguishers".into(),
            asset_name: Some("Extinguisher #4".into()),
            location: Some("Warehouse B".into()),
            inspector: Inspector {
                user_id: 7,
                display_name: "Dana Inspector".into(),
            },
        }
    }

    pub(crate) fn definitions(ids: &[&str]) -> Vec<ChecklistItemDefinition> {
        ids.iter()
            .map(|id| ChecklistItemDefinition {
                id: ItemId::new(*id),
                name: format!("Check {id}"),
                priority: Priority::Medium,
                instructions: String::new(),
                interval: ControlInterval::Monthly,
                buffer_days: 7,
            })
            .collect()
    }

    pub(crate) fn session(ids: &[&str]) -> InspectionSession {
        let started = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();
        SessionDraft::new(context(), &definitions(ids), started)
            .unwrap()
            .into_session(1)
    }

    pub(crate) fn set(session: &mut InspectionSession, id: &str, status: ItemStatus, notes: &str) {
        session
            .resolve_item(
                &ItemId::new(id),
                ItemUpdate {
                    status: Some(status),
                    notes: Some(notes.to_string()),
                    photo: None,
                },
                6,
            )
            .unwrap();
    }

    #[test]
    fn empty_template_rejected() {
        let started = Utc::now();
        assert_matches!(
            SessionDraft::new(context(), &[], started),
            Err(InspectionError::EmptyChecklist)
        );
    }

    #[test]
    fn new_session_starts_unset_and_incomplete() {
        let s = session(&["A", "B"]);
        assert!(!s.is_locked());
        assert_eq!(s.cursor(), 0);
        assert!(!s.is_complete());
        assert_eq!(
            s.progress(),
            Progress {
                total: 2,
                answered: 0,
                resolved: 0
            }
        );
    }

    #[test]
    fn advance_clamps_at_both_ends() {
        let mut s = session(&["A", "B", "C"]);
        assert_eq!(s.advance(Direction::Prev), 0);
        assert_eq!(s.advance(Direction::Next), 1);
        assert_eq!(s.advance(Direction::Next), 2);
        assert_eq!(s.advance(Direction::Next), 2);
        assert_eq!(s.current_item().item_id.as_str(), "C");
    }

    #[test]
    fn not_approved_without_notes_is_unresolved() {
        let mut s = session(&["A", "B"]);
        set(&mut s, "A", ItemStatus::Approved, "");
        set(&mut s, "B", ItemStatus::NotApproved, "");
        assert!(!s.is_complete());
        assert_eq!(s.unresolved_item_ids(), vec![ItemId::new("B")]);
        assert_eq!(s.progress().answered, 2);
        assert_eq!(s.progress().resolved, 1);

        set(&mut s, "B", ItemStatus::NotApproved, "gauge red");
        assert!(s.is_complete());
    }

    #[test]
    fn unknown_item_rejected() {
        let mut s = session(&["A"]);
        assert_matches!(
            s.resolve_item(&ItemId::new("Z"), ItemUpdate::default(), 6),
            Err(InspectionError::UnknownItem(id)) if id.as_str() == "Z"
        );
    }

    #[test]
    fn photo_bound_leaves_item_untouched() {
        let mut s = session(&["A"]);
        let id = ItemId::new("A");
        s.resolve_item(
            &id,
            ItemUpdate {
                photo: Some(PhotoRef::new("p1")),
                ..Default::default()
            },
            1,
        )
        .unwrap();

        let err = s
            .resolve_item(
                &id,
                ItemUpdate {
                    status: Some(ItemStatus::Approved),
                    photo: Some(PhotoRef::new("p2")),
                    ..Default::default()
                },
                1,
            )
            .unwrap_err();
        assert_matches!(err, InspectionError::PhotoLimitReached { max: 1, .. });
        let item = s.item(&id).unwrap();
        assert_eq!(item.status, ItemStatus::Unset);
        assert_eq!(item.photo_refs, vec![PhotoRef::new("p1")]);
    }

    #[test]
    fn locked_session_rejects_mutation() {
        let mut s = session(&["A"]);
        s.lock();
        assert_matches!(
            s.resolve_item(&ItemId::new("A"), ItemUpdate::default(), 6),
            Err(InspectionError::SessionLocked { session_id: 1 })
        );
        assert_matches!(
            s.remove_photo(&ItemId::new("A"), &PhotoRef::new("p")),
            Err(InspectionError::SessionLocked { .. })
        );
    }

    #[test]
    fn restore_clamps_cursor() {
        let s = session(&["A", "B"]);
        let restored = InspectionSession::restore(SessionParts {
            id: s.id(),
            context: s.context().clone(),
            items: s.items().to_vec(),
            cursor: 9,
            locked: false,
            started_at: s.started_at(),
            version: 4,
        })
        .unwrap();
        assert_eq!(restored.cursor(), 1);
        assert_eq!(restored.version(), 4);
    }
}
