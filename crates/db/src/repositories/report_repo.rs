//! Read-side queries over `inspection_reports`.
//!
//! Writes go through [`crate::PgInspectionStore`] so that finalization and
//! follow-up edits keep their atomicity guarantees.

use kontrol_core::types::DbId;
use sqlx::PgPool;

use crate::models::inspection::{FollowUpFilter, ReportListParams, ReportSummary};

/// Column list for report summaries.
const SUMMARY_COLUMNS: &str = "\
    id, session_id, control_id, control_name, asset_name, location, \
    inspector_id, inspector_name, overall_result, completed_at, \
    follow_up_required, follow_up_date, follow_up_resolved";

/// Default page size for report listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Upper bound on a requested page size.
pub const MAX_LIMIT: i64 = 200;

/// Provides report listing and counting.
pub struct ReportRepo;

impl ReportRepo {
    /// List an organization's reports, newest first.
    pub async fn list_filtered(
        pool: &PgPool,
        organization_id: DbId,
        params: &ReportListParams,
    ) -> Result<Vec<ReportSummary>, sqlx::Error> {
        let mut conditions = vec!["organization_id = $1".to_string()];
        let mut param_idx: usize = 2;

        if params.overall_result.is_some() {
            conditions.push(format!("overall_result = ${param_idx}"));
            param_idx += 1;
        }
        if params.control_id.is_some() {
            conditions.push(format!("control_id = ${param_idx}"));
            param_idx += 1;
        }
        match params.follow_up {
            Some(FollowUpFilter::Open) => conditions
                .push("follow_up_required = true AND follow_up_resolved = false".to_string()),
            Some(FollowUpFilter::Resolved) => {
                conditions.push("follow_up_resolved = true".to_string())
            }
            None => {}
        }

        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM inspection_reports WHERE {} \
             ORDER BY completed_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            conditions.join(" AND "),
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, ReportSummary>(&query).bind(organization_id);
        if let Some(result) = &params.overall_result {
            q = q.bind(result);
        }
        if let Some(control_id) = params.control_id {
            q = q.bind(control_id);
        }
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// Number of follow-ups that are required and not yet resolved.
    pub async fn count_open_follow_ups(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM inspection_reports \
             WHERE organization_id = $1 \
               AND follow_up_required = true AND follow_up_resolved = false",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
