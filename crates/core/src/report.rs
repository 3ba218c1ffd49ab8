//! Report finalization.
//!
//! [`finalize`] is the only way to create an [`InspectionReport`]. It copies
//! the session's items by value, so nothing done to the session afterwards
//! reaches the report.

use serde::{Deserialize, Serialize};

use crate::checklist::{ChecklistItemResult, ItemStatus};
use crate::error::InspectionError;
use crate::follow_up::FollowUp;
use crate::session::{InspectionSession, Inspector};
use crate::types::{DbId, Timestamp};

/// Aggregate outcome of a finalized inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallResult {
    Approved,
    NotApproved,
    Partial,
}

impl OverallResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::NotApproved => "not_approved",
            Self::Partial => "partial",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(Self::Approved),
            "not_approved" => Some(Self::NotApproved),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::NotApproved => "Not Approved",
            Self::Partial => "Partial",
        }
    }
}

/// Aggregate a set of item statuses. `unset` entries are ignored; `None`
/// when nothing was answered.
pub fn overall_result<I>(statuses: I) -> Option<OverallResult>
where
    I: IntoIterator<Item = ItemStatus>,
{
    let (mut approved, mut rejected) = (0usize, 0usize);
    for status in statuses {
        match status {
            ItemStatus::Approved => approved += 1,
            ItemStatus::NotApproved => rejected += 1,
            ItemStatus::Unset => {}
        }
    }
    match (approved, rejected) {
        (0, 0) => None,
        (_, 0) => Some(OverallResult::Approved),
        (0, _) => Some(OverallResult::NotApproved),
        _ => Some(OverallResult::Partial),
    }
}

/// Persisted fields of a report, used to rebuild one from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportParts {
    pub session_id: DbId,
    pub organization_id: DbId,
    pub control_id: DbId,
    pub control_name: String,
    pub asset_name: Option<String>,
    pub location: Option<String>,
    pub inspector: Inspector,
    pub items: Vec<ChecklistItemResult>,
    pub overall_result: OverallResult,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub follow_up: Option<FollowUp>,
}

/// Immutable record of a finalized inspection. Only the follow-up sidecar
/// can change after creation, through [`crate::follow_up`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionReport {
    session_id: DbId,
    organization_id: DbId,
    control_id: DbId,
    control_name: String,
    asset_name: Option<String>,
    location: Option<String>,
    inspector: Inspector,
    items: Vec<ChecklistItemResult>,
    overall_result: OverallResult,
    is_locked: bool,
    started_at: Timestamp,
    completed_at: Timestamp,
    follow_up: Option<FollowUp>,
}

impl InspectionReport {
    /// Rebuild a stored report. Stored reports are always locked.
    pub fn restore(parts: ReportParts) -> Self {
        Self {
            session_id: parts.session_id,
            organization_id: parts.organization_id,
            control_id: parts.control_id,
            control_name: parts.control_name,
            asset_name: parts.asset_name,
            location: parts.location,
            inspector: parts.inspector,
            items: parts.items,
            overall_result: parts.overall_result,
            is_locked: true,
            started_at: parts.started_at,
            completed_at: parts.completed_at,
            follow_up: parts.follow_up,
        }
    }

    pub fn session_id(&self) -> DbId {
        self.session_id
    }

    pub fn organization_id(&self) -> DbId {
        self.organization_id
    }

    pub fn control_id(&self) -> DbId {
        self.control_id
    }

    pub fn control_name(&self) -> &str {
        &self.control_name
    }

    pub fn asset_name(&self) -> Option<&str> {
        self.asset_name.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn inspector(&self) -> &Inspector {
        &self.inspector
    }

    pub fn items(&self) -> &[ChecklistItemResult] {
        &self.items
    }

    pub fn overall_result(&self) -> OverallResult {
        self.overall_result
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn completed_at(&self) -> Timestamp {
        self.completed_at
    }

    pub fn follow_up(&self) -> Option<&FollowUp> {
        self.follow_up.as_ref()
    }

    pub(crate) fn follow_up_mut(&mut self) -> Option<&mut FollowUp> {
        self.follow_up.as_mut()
    }
}

/// A stored report together with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub id: DbId,
    #[serde(flatten)]
    pub report: InspectionReport,
}

/// Turn a complete session into a report and lock the session.
///
/// Fails without touching the session when it is already locked or still
/// has unresolved items.
pub fn finalize(
    session: &mut InspectionSession,
    completed_at: Timestamp,
) -> Result<InspectionReport, InspectionError> {
    session.ensure_unlocked()?;

    let unresolved = session.unresolved_item_ids();
    if !unresolved.is_empty() {
        return Err(InspectionError::Incomplete { unresolved });
    }

    let items = session.items().to_vec();
    let overall = overall_result(items.iter().map(|i| i.status))
        .ok_or(InspectionError::EmptyChecklist)?;
    let follow_up = (overall != OverallResult::Approved).then(FollowUp::default);
    let ctx = session.context().clone();

    let report = InspectionReport {
        session_id: session.id(),
        organization_id: ctx.organization_id,
        control_id: ctx.control_id,
        control_name: ctx.control_name,
        asset_name: ctx.asset_name,
        location: ctx.location,
        inspector: ctx.inspector,
        items,
        overall_result: overall,
        is_locked: true,
        started_at: session.started_at(),
        completed_at,
        follow_up,
    };
    session.lock();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::checklist::ItemId;
    use crate::session::tests::{session, set};
    use crate::session::ItemUpdate;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn overall_result_law() {
        use ItemStatus::*;
        assert_eq!(overall_result([Approved, Approved]), Some(OverallResult::Approved));
        assert_eq!(
            overall_result([NotApproved, NotApproved]),
            Some(OverallResult::NotApproved)
        );
        assert_eq!(overall_result([Approved, NotApproved]), Some(OverallResult::Partial));
        assert_eq!(overall_result([Unset]), None);
    }

    #[test]
    fn incomplete_session_names_unresolved_items_and_stays_unlocked() {
        let mut s = session(&["A", "B", "C"]);
        set(&mut s, "A", ItemStatus::Approved, "");
        set(&mut s, "B", ItemStatus::NotApproved, "gauge red");
        let before = s.clone();

        let err = finalize(&mut s, now()).unwrap_err();
        assert_eq!(err.unresolved_item_ids(), Some(&[ItemId::new("C")][..]));
        assert_eq!(s, before);
        assert!(!s.is_locked());
    }

    #[test]
    fn partial_report_gets_empty_follow_up() {
        let mut s = session(&["A", "B", "C"]);
        set(&mut s, "A", ItemStatus::Approved, "");
        set(&mut s, "B", ItemStatus::NotApproved, "gauge red");
        set(&mut s, "C", ItemStatus::Approved, "");

        let report = finalize(&mut s, now()).unwrap();
        assert_eq!(report.overall_result(), OverallResult::Partial);
        assert!(report.is_locked());
        assert_eq!(report.completed_at(), now());
        let follow_up = report.follow_up().unwrap();
        assert_eq!(follow_up.notes, "");
        assert!(follow_up.follow_up_date.is_none());
        assert!(s.is_locked());
    }

    #[test]
    fn all_approved_has_no_follow_up() {
        let mut s = session(&["A", "B"]);
        set(&mut s, "A", ItemStatus::Approved, "");
        set(&mut s, "B", ItemStatus::Approved, "");
        let report = finalize(&mut s, now()).unwrap();
        assert_eq!(report.overall_result(), OverallResult::Approved);
        assert!(report.follow_up().is_none());
    }

    #[test]
    fn all_rejected_is_not_approved() {
        let mut s = session(&["A"]);
        set(&mut s, "A", ItemStatus::NotApproved, "missing pin");
        let report = finalize(&mut s, now()).unwrap();
        assert_eq!(report.overall_result(), OverallResult::NotApproved);
        assert!(report.follow_up().is_some());
    }

    #[test]
    fn second_finalize_fails_and_report_is_unchanged() {
        let mut s = session(&["A"]);
        set(&mut s, "A", ItemStatus::Approved, "");
        let report = finalize(&mut s, now()).unwrap();
        let snapshot = report.clone();

        assert_matches!(
            finalize(&mut s, now()),
            Err(InspectionError::SessionLocked { .. })
        );
        assert_matches!(
            s.resolve_item(&ItemId::new("A"), ItemUpdate::default(), 6),
            Err(InspectionError::SessionLocked { .. })
        );
        assert_eq!(report, snapshot);
    }

    #[test]
    fn report_serializes_flattened_with_id() {
        let mut s = session(&["A"]);
        set(&mut s, "A", ItemStatus::Approved, "");
        let report = finalize(&mut s, now()).unwrap();
        let json = serde_json::to_value(ReportRecord { id: 5, report }).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["overall_result"], "approved");
        assert_eq!(json["is_locked"], true);
        assert!(json["follow_up"].is_null());
    }
}
