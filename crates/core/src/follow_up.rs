//! Follow-up tracking on finalized reports.
//!
//! Resolution policy: a follow-up can only be resolved once it has a
//! follow-up date, and resolution is one-way. A resolved follow-up rejects
//! further edits.

use serde::{Deserialize, Serialize};

use crate::error::InspectionError;
use crate::report::InspectionReport;
use crate::types::{Date, DbId, Timestamp};

/// Mutable remediation record attached to a non-approved report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub follow_up_date: Option<Date>,
    pub notes: String,
    pub resolved: bool,
    pub resolved_by: Option<DbId>,
    pub resolved_at: Option<Timestamp>,
}

/// Fields an administrator may change. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FollowUpUpdate {
    pub follow_up_date: Option<Date>,
    pub notes: Option<String>,
}

fn open_follow_up(report: &mut InspectionReport) -> Result<&mut FollowUp, InspectionError> {
    let follow_up = report.follow_up_mut().ok_or(InspectionError::NoFollowUp)?;
    if follow_up.resolved {
        return Err(InspectionError::FollowUpAlreadyResolved);
    }
    Ok(follow_up)
}

/// Change the follow-up date and/or notes. Item results are never touched.
pub fn update_follow_up(
    report: &mut InspectionReport,
    update: FollowUpUpdate,
) -> Result<&FollowUp, InspectionError> {
    let follow_up = open_follow_up(report)?;
    if let Some(date) = update.follow_up_date {
        follow_up.follow_up_date = Some(date);
    }
    if let Some(notes) = update.notes {
        follow_up.notes = notes;
    }
    Ok(follow_up)
}

/// Mark the follow-up as remediated.
pub fn mark_resolved(
    report: &mut InspectionReport,
    resolved_by: DbId,
    resolved_at: Timestamp,
) -> Result<&FollowUp, InspectionError> {
    let follow_up = open_follow_up(report)?;
    if follow_up.follow_up_date.is_none() {
        return Err(InspectionError::FollowUpDateRequired);
    }
    follow_up.resolved = true;
    follow_up.resolved_by = Some(resolved_by);
    follow_up.resolved_at = Some(resolved_at);
    Ok(follow_up)
}
