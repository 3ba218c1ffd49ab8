//! Inspection session and report rows.
//!
//! Item results are stored as JSONB snapshots; the conversions into domain
//! values live in [`crate::inspection_store`].

use chrono::NaiveDate;
use kontrol_core::checklist::ChecklistItemResult;
use kontrol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `inspection_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: DbId,
    pub organization_id: DbId,
    pub control_id: DbId,
    pub control_name: String,
    pub asset_name: Option<String>,
    pub location: Option<String>,
    pub inspector_id: DbId,
    pub inspector_name: String,
    pub items: Json<Vec<ChecklistItemResult>>,
    pub cursor_position: i32,
    pub locked: bool,
    pub version: i64,
    pub started_at: Timestamp,
}

/// A row from the `inspection_reports` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: DbId,
    pub session_id: DbId,
    pub organization_id: DbId,
    pub control_id: DbId,
    pub control_name: String,
    pub asset_name: Option<String>,
    pub location: Option<String>,
    pub inspector_id: DbId,
    pub inspector_name: String,
    pub items: Json<Vec<ChecklistItemResult>>,
    pub overall_result: String,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_notes: String,
    pub follow_up_resolved: bool,
    pub follow_up_resolved_by: Option<DbId>,
    pub follow_up_resolved_at: Option<Timestamp>,
}

/// Report listing entry without item bodies.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportSummary {
    pub id: DbId,
    pub session_id: DbId,
    pub control_id: DbId,
    pub control_name: String,
    pub asset_name: Option<String>,
    pub location: Option<String>,
    pub inspector_id: DbId,
    pub inspector_name: String,
    pub overall_result: String,
    pub completed_at: Timestamp,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_resolved: bool,
}

/// Follow-up filter for report listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpFilter {
    Open,
    Resolved,
}

/// Query parameters for listing reports.
#[derive(Debug, Deserialize)]
pub struct ReportListParams {
    pub overall_result: Option<String>,
    pub follow_up: Option<FollowUpFilter>,
    pub control_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
