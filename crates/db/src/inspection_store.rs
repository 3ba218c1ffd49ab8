//! PostgreSQL implementation of [`InspectionStore`].
//!
//! Session rows carry a `version` column. Every write is an
//! `UPDATE ... WHERE version = $n AND locked = false`; zero affected rows
//! means either a concurrent writer or a finalized session, and the row is
//! re-read to tell the two apart. Finalization flips `locked` and inserts
//! the report inside one transaction.

use async_trait::async_trait;
use kontrol_core::checklist::{ChecklistItemDefinition, ItemId, Priority};
use kontrol_core::controls::ControlStatus;
use kontrol_core::follow_up::FollowUp;
use kontrol_core::report::{InspectionReport, OverallResult, ReportParts, ReportRecord};
use kontrol_core::schedule::ControlInterval;
use kontrol_core::session::{
    InspectionSession, Inspector, SessionContext, SessionDraft, SessionParts,
};
use kontrol_core::store::{ChecklistTemplate, InspectionStore, StoreError, StoreResult};
use kontrol_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::control::ControlItem;
use crate::models::inspection::{ReportRow, SessionRow};
use crate::repositories::ControlRepo;

const SESSION_COLUMNS: &str = "\
    id, organization_id, control_id, control_name, asset_name, location, \
    inspector_id, inspector_name, items, cursor_position, locked, version, started_at";

const REPORT_COLUMNS: &str = "\
    id, session_id, organization_id, control_id, control_name, asset_name, location, \
    inspector_id, inspector_name, items, overall_result, started_at, completed_at, \
    follow_up_required, follow_up_date, follow_up_notes, follow_up_resolved, \
    follow_up_resolved_by, follow_up_resolved_at";

fn backend(e: sqlx::Error) -> StoreError {
    tracing::error!(error = %e, "Inspection store query failed");
    StoreError::Backend(e.to_string())
}

/// [`InspectionStore`] backed by the `inspection_sessions` and
/// `inspection_reports` tables.
#[derive(Debug, Clone)]
pub struct PgInspectionStore {
    pool: PgPool,
}

impl PgInspectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explain why a versioned write matched no row.
    async fn classify_missed_write(&self, session: &InspectionSession) -> StoreError {
        let row: Result<Option<(bool, i64)>, sqlx::Error> =
            sqlx::query_as("SELECT locked, version FROM inspection_sessions WHERE id = $1")
                .bind(session.id())
                .fetch_optional(&self.pool)
                .await;
        match row {
            Ok(Some((true, _))) => StoreError::SessionLocked {
                session_id: session.id(),
            },
            Ok(Some((false, _))) => StoreError::VersionConflict {
                session_id: session.id(),
                expected: session.version(),
            },
            Ok(None) => StoreError::not_found("inspection session", session.id()),
            Err(e) => backend(e),
        }
    }

    /// Explain why a follow-up write matched no row.
    async fn classify_missed_follow_up(&self, report_id: DbId) -> StoreError {
        let row: Result<Option<(bool, bool)>, sqlx::Error> = sqlx::query_as(
            "SELECT follow_up_required, follow_up_resolved FROM inspection_reports WHERE id = $1",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await;
        match row {
            Ok(Some((true, true))) => StoreError::FollowUpResolved { report_id },
            Ok(Some(_)) | Ok(None) => StoreError::not_found("inspection report", report_id),
            Err(e) => backend(e),
        }
    }
}

fn session_from_row(row: SessionRow) -> StoreResult<InspectionSession> {
    let id = row.id;
    let parts = SessionParts {
        id,
        context: SessionContext {
            organization_id: row.organization_id,
            control_id: row.control_id,
            control_name: row.control_name,
            asset_name: row.asset_name,
            location: row.location,
            inspector: Inspector {
                user_id: row.inspector_id,
                display_name: row.inspector_name,
            },
        },
        items: row.items.0,
        cursor: usize::try_from(row.cursor_position).unwrap_or(0),
        locked: row.locked,
        started_at: row.started_at,
        version: row.version,
    };
    InspectionSession::restore(parts)
        .map_err(|e| StoreError::InvalidPersistedValue(format!("session {id}: {e}")))
}

fn report_from_row(row: ReportRow) -> StoreResult<ReportRecord> {
    let overall_result = OverallResult::from_str_db(&row.overall_result).ok_or_else(|| {
        StoreError::InvalidPersistedValue(format!(
            "report {}: unknown overall result '{}'",
            row.id, row.overall_result
        ))
    })?;
    let follow_up = row.follow_up_required.then(|| FollowUp {
        follow_up_date: row.follow_up_date,
        notes: row.follow_up_notes,
        resolved: row.follow_up_resolved,
        resolved_by: row.follow_up_resolved_by,
        resolved_at: row.follow_up_resolved_at,
    });
    let report = InspectionReport::restore(ReportParts {
        session_id: row.session_id,
        organization_id: row.organization_id,
        control_id: row.control_id,
        control_name: row.control_name,
        asset_name: row.asset_name,
        location: row.location,
        inspector: Inspector {
            user_id: row.inspector_id,
            display_name: row.inspector_name,
        },
        items: row.items.0,
        overall_result,
        started_at: row.started_at,
        completed_at: row.completed_at,
        follow_up,
    });
    Ok(ReportRecord { id: row.id, report })
}

fn buffer_days_column(control_id: DbId, value: i32) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| {
        StoreError::InvalidPersistedValue(format!(
            "control {control_id}: negative buffer days {value}"
        ))
    })
}

fn item_definition(
    item: ControlItem,
    interval: ControlInterval,
    buffer_days: u32,
) -> StoreResult<ChecklistItemDefinition> {
    let priority = Priority::from_str_db(&item.priority).ok_or_else(|| {
        StoreError::InvalidPersistedValue(format!(
            "control item {}: unknown priority '{}'",
            item.id, item.priority
        ))
    })?;
    Ok(ChecklistItemDefinition {
        id: ItemId::new(item.item_key),
        name: item.name,
        priority,
        instructions: item.instructions,
        interval,
        buffer_days,
    })
}

fn cursor_column(session: &InspectionSession) -> i32 {
    i32::try_from(session.cursor()).unwrap_or(i32::MAX)
}

#[async_trait]
impl InspectionStore for PgInspectionStore {
    async fn load_checklist_template(
        &self,
        organization_id: DbId,
        control_id: DbId,
    ) -> StoreResult<ChecklistTemplate> {
        let control = ControlRepo::find_by_id(&self.pool, organization_id, control_id)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::not_found("master control", control_id))?;
        let interval = ControlInterval::from_str_db(&control.control_interval)
            .map_err(|e| StoreError::InvalidPersistedValue(e.to_string()))?;
        let buffer_days = buffer_days_column(control.id, control.buffer_days)?;
        let status = ControlStatus::from_str_db(&control.status)
            .map_err(|e| StoreError::InvalidPersistedValue(e.to_string()))?;

        let items = ControlRepo::find_items(&self.pool, control.id)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|item| item_definition(item, interval, buffer_days))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(ChecklistTemplate {
            control_id: control.id,
            organization_id: control.organization_id,
            name: control.name,
            asset_name: control.asset_name,
            location: control.location,
            is_active: status == ControlStatus::Active,
            items,
        })
    }

    async fn find_control_by_qr_code(
        &self,
        organization_id: DbId,
        qr_code: &str,
    ) -> StoreResult<DbId> {
        ControlRepo::find_by_qr_code(&self.pool, organization_id, qr_code)
            .await
            .map_err(backend)?
            .map(|c| c.id)
            .ok_or_else(|| StoreError::not_found("master control", qr_code))
    }

    async fn create_session(&self, draft: SessionDraft) -> StoreResult<InspectionSession> {
        let ctx = &draft.context;
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO inspection_sessions \
                (organization_id, control_id, control_name, asset_name, location, \
                 inspector_id, inspector_name, items, started_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(ctx.organization_id)
        .bind(ctx.control_id)
        .bind(&ctx.control_name)
        .bind(&ctx.asset_name)
        .bind(&ctx.location)
        .bind(ctx.inspector.user_id)
        .bind(&ctx.inspector.display_name)
        .bind(Json(&draft.items))
        .bind(draft.started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(draft.into_session(id))
    }

    async fn load_session(
        &self,
        organization_id: DbId,
        session_id: DbId,
    ) -> StoreResult<InspectionSession> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM inspection_sessions \
             WHERE id = $1 AND organization_id = $2"
        );
        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(session_id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::not_found("inspection session", session_id))?;
        session_from_row(row)
    }

    async fn save_session(&self, session: &InspectionSession) -> StoreResult<i64> {
        if session.is_locked() {
            return Err(StoreError::SessionLocked {
                session_id: session.id(),
            });
        }
        let updated: Option<(i64,)> = sqlx::query_as(
            "UPDATE inspection_sessions SET \
                 items = $3, cursor_position = $4, version = version + 1 \
             WHERE id = $1 AND version = $2 AND locked = false \
             RETURNING version",
        )
        .bind(session.id())
        .bind(session.version())
        .bind(Json(session.items()))
        .bind(cursor_column(session))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match updated {
            Some((version,)) => Ok(version),
            None => Err(self.classify_missed_write(session).await),
        }
    }

    async fn save_report(
        &self,
        session: &InspectionSession,
        report: &InspectionReport,
    ) -> StoreResult<DbId> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let locked = sqlx::query(
            "UPDATE inspection_sessions SET \
                 items = $3, cursor_position = $4, locked = true, version = version + 1 \
             WHERE id = $1 AND version = $2 AND locked = false",
        )
        .bind(session.id())
        .bind(session.version())
        .bind(Json(session.items()))
        .bind(cursor_column(session))
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if locked.rows_affected() == 0 {
            tx.rollback().await.map_err(backend)?;
            return Err(self.classify_missed_write(session).await);
        }

        let follow_up = report.follow_up();
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO inspection_reports \
                (session_id, organization_id, control_id, control_name, asset_name, location, \
                 inspector_id, inspector_name, items, overall_result, started_at, completed_at, \
                 follow_up_required, follow_up_date, follow_up_notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING id",
        )
        .bind(report.session_id())
        .bind(report.organization_id())
        .bind(report.control_id())
        .bind(report.control_name())
        .bind(report.asset_name())
        .bind(report.location())
        .bind(report.inspector().user_id)
        .bind(&report.inspector().display_name)
        .bind(Json(report.items()))
        .bind(report.overall_result().as_str())
        .bind(report.started_at())
        .bind(report.completed_at())
        .bind(follow_up.is_some())
        .bind(follow_up.and_then(|f| f.follow_up_date))
        .bind(follow_up.map(|f| f.notes.as_str()).unwrap_or_default())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        tracing::info!(
            report_id = id,
            session_id = session.id(),
            overall_result = report.overall_result().as_str(),
            "Inspection report stored",
        );
        Ok(id)
    }

    async fn load_report(
        &self,
        organization_id: DbId,
        report_id: DbId,
    ) -> StoreResult<ReportRecord> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM inspection_reports \
             WHERE id = $1 AND organization_id = $2"
        );
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(report_id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::not_found("inspection report", report_id))?;
        report_from_row(row)
    }

    async fn save_follow_up(&self, report_id: DbId, follow_up: &FollowUp) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE inspection_reports SET \
                 follow_up_date = $2, follow_up_notes = $3, follow_up_resolved = $4, \
                 follow_up_resolved_by = $5, follow_up_resolved_at = $6 \
             WHERE id = $1 AND follow_up_required = true AND follow_up_resolved = false",
        )
        .bind(report_id)
        .bind(follow_up.follow_up_date)
        .bind(&follow_up.notes)
        .bind(follow_up.resolved)
        .bind(follow_up.resolved_by)
        .bind(follow_up.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(self.classify_missed_follow_up(report_id).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn control_item(priority: &str) -> ControlItem {
        ControlItem {
            id: 7,
            control_id: 3,
            item_key: "A".to_string(),
            name: "Pressure gauge".to_string(),
            priority: priority.to_string(),
            instructions: String::new(),
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn item_definition_carries_control_schedule() {
        let def = item_definition(control_item("high"), ControlInterval::Monthly, 4).unwrap();
        assert_eq!(def.id, ItemId::new("A"));
        assert_eq!(def.priority, Priority::High);
        assert_eq!(def.interval, ControlInterval::Monthly);
        assert_eq!(def.buffer_days, 4);
    }

    #[test]
    fn unknown_priority_is_reported_not_defaulted() {
        let err =
            item_definition(control_item("urgent"), ControlInterval::Monthly, 4).unwrap_err();
        assert_matches!(err, StoreError::InvalidPersistedValue(msg) if msg.contains("urgent"));
    }

    #[test]
    fn negative_buffer_days_are_reported_not_zeroed() {
        assert_eq!(buffer_days_column(3, 16).unwrap(), 16);
        assert_matches!(
            buffer_days_column(3, -2),
            Err(StoreError::InvalidPersistedValue(msg)) if msg.contains("-2")
        );
    }
}
