//! Handlers for the `/reports` resource: listing, follow-up tracking and
//! export.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use kontrol_core::error::CoreError;
use kontrol_core::follow_up::{
    mark_resolved, update_follow_up as apply_follow_up_update, FollowUpUpdate,
};
use kontrol_core::report::ReportRecord;
use kontrol_core::types::DbId;
use kontrol_db::models::inspection::{ReportListParams, ReportSummary};
use kontrol_db::repositories::ReportRepo;
use kontrol_events::{event_types, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Publish a report lifecycle event. Fire-and-forget.
pub(crate) fn publish_report_event(
    state: &AppState,
    event_type: &str,
    record: &ReportRecord,
    actor_user_id: DbId,
) {
    let report = &record.report;
    let follow_up = report.follow_up();
    state.event_bus.publish(
        PlatformEvent::new(event_type)
            .with_organization(report.organization_id())
            .with_source("report", record.id)
            .with_actor(actor_user_id)
            .with_payload(serde_json::json!({
                "report_id": record.id,
                "control_name": report.control_name(),
                "overall_result": report.overall_result().as_str(),
                "inspector_name": report.inspector().display_name,
                "follow_up_date": follow_up.and_then(|f| f.follow_up_date),
                "follow_up_notes": follow_up.map(|f| f.notes.as_str()),
            })),
    );
}

/// Load a report the caller may see: admins of the organization and the
/// inspector who produced it.
async fn load_for(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<ReportRecord> {
    let org = user.organization_id()?;
    let record = state.store.load_report(org, id).await?;
    if record.report.inspector().user_id != user.user_id && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only admins and the report's inspector may view it".into(),
        )));
    }
    Ok(record)
}

/// GET /api/v1/reports
pub async fn list(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ReportListParams>,
) -> AppResult<Json<DataResponse<Vec<ReportSummary>>>> {
    let org = admin.organization_id()?;
    let reports = ReportRepo::list_filtered(&state.pool, org, &params).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// GET /api/v1/reports/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReportRecord>>> {
    let record = load_for(&state, &user, id).await?;
    Ok(Json(DataResponse { data: record }))
}

/// PUT /api/v1/reports/{id}/follow-up
pub async fn update_follow_up(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<FollowUpUpdate>,
) -> AppResult<Json<DataResponse<ReportRecord>>> {
    let mut record = load_for(&state, &admin, id).await?;
    let follow_up = apply_follow_up_update(&mut record.report, input)?.clone();
    state.store.save_follow_up(id, &follow_up).await?;

    tracing::info!(report_id = id, updated_by = admin.user_id, "Follow-up updated");
    publish_report_event(
        &state,
        event_types::REPORT_FOLLOW_UP_UPDATED,
        &record,
        admin.user_id,
    );
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/reports/{id}/follow-up/resolve
///
/// Requires a scheduled follow-up date. Resolution is final.
pub async fn resolve_follow_up(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReportRecord>>> {
    let mut record = load_for(&state, &admin, id).await?;
    let follow_up = mark_resolved(&mut record.report, admin.user_id, Utc::now())?.clone();
    state.store.save_follow_up(id, &follow_up).await?;

    tracing::info!(report_id = id, resolved_by = admin.user_id, "Follow-up resolved");
    publish_report_event(
        &state,
        event_types::REPORT_FOLLOW_UP_RESOLVED,
        &record,
        admin.user_id,
    );
    Ok(Json(DataResponse { data: record }))
}

/// GET /api/v1/reports/{id}/export
pub async fn export(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let record = load_for(&state, &user, id).await?;
    let document = state.exporter.export(&record)?;
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.file_name),
            ),
        ],
        document.bytes,
    ))
}
