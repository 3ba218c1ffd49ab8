//! Handlers for the `/schedule` dashboard. Tiers are computed on read.

use axum::extract::{Query, State};
use axum::Json;
use kontrol_core::controls::validate_buffer_days;
use kontrol_core::schedule::{
    build_schedule, ControlInterval, ScheduleEntry, ScheduledControl, TierCounts,
};
use kontrol_core::types::{Date, DbId};
use kontrol_db::models::control::ScheduleRow;
use kontrol_db::repositories::{ControlRepo, ReportRepo};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::TodayParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScheduleSummary {
    pub today: Date,
    #[serde(flatten)]
    pub tiers: TierCounts,
    pub open_follow_ups: i64,
}

fn to_scheduled(row: ScheduleRow) -> AppResult<ScheduledControl> {
    Ok(ScheduledControl {
        interval: ControlInterval::from_str_db(&row.control_interval)?,
        buffer_days: validate_buffer_days(row.buffer_days)?,
        anchor_date: row.created_at.date_naive(),
        last_completed: row.last_completed.map(|t| t.date_naive()),
        control_id: row.id,
        control_name: row.name,
    })
}

async fn load_schedule(
    state: &AppState,
    organization_id: DbId,
    today: Date,
) -> AppResult<Vec<ScheduleEntry>> {
    let controls = ControlRepo::list_for_schedule(&state.pool, organization_id)
        .await?
        .into_iter()
        .map(to_scheduled)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(build_schedule(&controls, today))
}

/// GET /api/v1/schedule
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TodayParams>,
) -> AppResult<Json<DataResponse<Vec<ScheduleEntry>>>> {
    let org = user.organization_id()?;
    let entries = load_schedule(&state, org, params.resolve()).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/schedule/summary
pub async fn summary(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TodayParams>,
) -> AppResult<Json<DataResponse<ScheduleSummary>>> {
    let org = user.organization_id()?;
    let today = params.resolve();
    let entries = load_schedule(&state, org, today).await?;
    let open_follow_ups = ReportRepo::count_open_follow_ups(&state.pool, org).await?;
    Ok(Json(DataResponse {
        data: ScheduleSummary {
            today,
            tiers: TierCounts::from_entries(&entries),
            open_follow_ups,
        },
    }))
}
