//! Handlers for the `/controls` resource (master controls and their
//! checklist items).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use kontrol_core::checklist::ChecklistItemDefinition;
use kontrol_core::controls::{
    control_warnings, generate_qr_code, validate_buffer_days, validate_item_definitions,
};
use kontrol_core::directory::{validate_name, validate_optional_name};
use kontrol_core::error::CoreError;
use kontrol_core::schedule::ControlInterval;
use kontrol_core::types::DbId;
use kontrol_db::models::control::{
    ControlItemInput, ControlListParams, ControlWithItems, CreateControl, MasterControl,
    ReplaceControlItems, UpdateControl,
};
use kontrol_db::repositories::ControlRepo;
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// A control with its items and any schedule warnings.
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    #[serde(flatten)]
    pub control: ControlWithItems,
    pub warnings: Vec<String>,
}

impl ControlResponse {
    fn new(control: ControlWithItems) -> AppResult<Self> {
        let (interval, buffer_days) = schedule_settings(&control.control)?;
        Ok(Self {
            warnings: control_warnings(interval, buffer_days),
            control,
        })
    }
}

fn control_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "MasterControl",
        id,
    })
}

fn schedule_settings(control: &MasterControl) -> AppResult<(ControlInterval, u32)> {
    let interval = ControlInterval::from_str_db(&control.control_interval)?;
    let buffer_days = validate_buffer_days(control.buffer_days)?;
    Ok((interval, buffer_days))
}

/// Domain-level item checks: non-empty, unique non-blank keys, non-blank names.
fn check_items(
    items: &[ControlItemInput],
    interval: ControlInterval,
    buffer_days: u32,
) -> AppResult<Vec<ChecklistItemDefinition>> {
    let definitions: Vec<_> = items
        .iter()
        .map(|i| i.to_definition(interval, buffer_days))
        .collect();
    validate_item_definitions(&definitions)?;
    Ok(definitions)
}

/// GET /api/v1/controls
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ControlListParams>,
) -> AppResult<Json<DataResponse<Vec<MasterControl>>>> {
    let org = user.organization_id()?;
    let controls = ControlRepo::list(&state.pool, org, &params).await?;
    Ok(Json(DataResponse { data: controls }))
}

/// POST /api/v1/controls
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateControl>,
) -> AppResult<(StatusCode, Json<DataResponse<ControlResponse>>)> {
    let org = admin.organization_id()?;
    input.validate()?;
    validate_name("name", &input.name)?;
    let buffer_days = validate_buffer_days(input.buffer_days)?;
    check_items(&input.items, input.interval, buffer_days)?;

    let control = ControlRepo::create(&state.pool, org, &generate_qr_code(), &input).await?;
    tracing::info!(
        control_id = control.control.id,
        organization_id = org,
        items = control.items.len(),
        "Master control created"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ControlResponse::new(control)?,
        }),
    ))
}

/// GET /api/v1/controls/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ControlResponse>>> {
    let org = user.organization_id()?;
    let control = ControlRepo::find_with_items(&state.pool, org, id)
        .await?
        .ok_or_else(|| control_not_found(id))?;
    Ok(Json(DataResponse {
        data: ControlResponse::new(control)?,
    }))
}

/// PUT /api/v1/controls/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateControl>,
) -> AppResult<Json<DataResponse<ControlResponse>>> {
    let org = admin.organization_id()?;
    input.validate()?;
    validate_optional_name("name", input.name.as_deref())?;
    if let Some(buffer_days) = input.buffer_days {
        validate_buffer_days(buffer_days)?;
    }

    let control = ControlRepo::update(&state.pool, org, id, &input)
        .await?
        .ok_or_else(|| control_not_found(id))?;
    let items = ControlRepo::find_items(&state.pool, control.id).await?;
    Ok(Json(DataResponse {
        data: ControlResponse::new(ControlWithItems { control, items })?,
    }))
}

/// PUT /api/v1/controls/{id}/items
///
/// Replaces the checklist. Sessions already started keep their own copy.
pub async fn replace_items(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReplaceControlItems>,
) -> AppResult<Json<DataResponse<ControlResponse>>> {
    let org = admin.organization_id()?;
    input.validate()?;
    let control = ControlRepo::find_by_id(&state.pool, org, id)
        .await?
        .ok_or_else(|| control_not_found(id))?;
    let (interval, buffer_days) = schedule_settings(&control)?;
    check_items(&input.items, interval, buffer_days)?;

    let items = ControlRepo::replace_items(&state.pool, control.id, &input.items).await?;
    tracing::info!(control_id = id, items = items.len(), "Checklist items replaced");
    Ok(Json(DataResponse {
        data: ControlResponse::new(ControlWithItems { control, items })?,
    }))
}

/// DELETE /api/v1/controls/{id}
pub async fn deactivate(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let org = admin.organization_id()?;
    if ControlRepo::deactivate(&state.pool, org, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(control_not_found(id))
    }
}
