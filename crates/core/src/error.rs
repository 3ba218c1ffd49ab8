use serde::Serialize;

use crate::checklist::ItemId;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of [`InspectionError`] values.
///
/// Callers branch on the kind to decide how a failure is presented:
/// validation failures are shown to the inspector, invalid-state failures
/// point at a bug in the calling code, and bounds failures ask the user to
/// remove something before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InvalidState,
    Bounds,
}

/// Failures raised by the inspection workflow (sessions, finalization,
/// follow-up tracking).
///
/// Every variant carries the identifiers needed to render a precise message;
/// none of them embeds presentation text beyond the `Display` impl.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectionError {
    /// Finalization attempted while items are still unresolved.
    #[error("Inspection is incomplete; unresolved items: {}", join_ids(.unresolved))]
    Incomplete { unresolved: Vec<ItemId> },

    /// A session cannot be started from a template without items.
    #[error("Checklist has no items")]
    EmptyChecklist,

    /// The referenced item is not part of the session.
    #[error("Checklist item '{0}' is not part of this inspection")]
    UnknownItem(ItemId),

    /// The session has been finalized and no longer accepts mutations.
    #[error("Inspection session {session_id} is locked")]
    SessionLocked { session_id: DbId },

    /// Follow-up operations on a report whose items were all approved.
    #[error("Report has no follow-up; all items were approved")]
    NoFollowUp,

    /// The follow-up was already marked resolved.
    #[error("Follow-up is already resolved")]
    FollowUpAlreadyResolved,

    /// Resolving a follow-up requires a scheduled follow-up date.
    #[error("A follow-up date must be set before the follow-up can be resolved")]
    FollowUpDateRequired,

    /// Export requested for a report that is not locked.
    #[error("Report is not locked and cannot be exported")]
    ReportNotLocked,

    /// Attaching another photo would exceed the per-item maximum.
    #[error("Checklist item '{item_id}' already has the maximum of {max} photos")]
    PhotoLimitReached { item_id: ItemId, max: usize },
}

impl InspectionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Incomplete { .. }
            | Self::EmptyChecklist
            | Self::UnknownItem(_)
            | Self::FollowUpDateRequired => ErrorKind::Validation,
            Self::SessionLocked { .. }
            | Self::NoFollowUp
            | Self::FollowUpAlreadyResolved
            | Self::ReportNotLocked => ErrorKind::InvalidState,
            Self::PhotoLimitReached { .. } => ErrorKind::Bounds,
        }
    }

    /// The unresolved item ids carried by an [`InspectionError::Incomplete`].
    pub fn unresolved_item_ids(&self) -> Option<&[ItemId]> {
        match self {
            Self::Incomplete { unresolved } => Some(unresolved),
            _ => None,
        }
    }
}

fn join_ids(ids: &[ItemId]) -> String {
    ids.iter()
        .map(ItemId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_lists_item_ids_in_message() {
        let err = InspectionError::Incomplete {
            unresolved: vec![ItemId::new("B"), ItemId::new("C")],
        };
        assert_eq!(
            err.to_string(),
            "Inspection is incomplete; unresolved items: B, C"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.unresolved_item_ids().map(<[ItemId]>::len), Some(2));
    }

    #[test]
    fn locked_session_is_invalid_state() {
        let err = InspectionError::SessionLocked { session_id: 9 };
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.unresolved_item_ids().is_none());
    }

    #[test]
    fn photo_limit_is_bounds() {
        let err = InspectionError::PhotoLimitReached {
            item_id: ItemId::new("item1"),
            max: 6,
        };
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert!(err.to_string().contains("maximum of 6"));
    }
}
