//! Handlers for `/areas` and the nested `/areas/{id}/departments`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use kontrol_core::directory::{validate_name, validate_optional_name};
use kontrol_core::error::CoreError;
use kontrol_core::types::DbId;
use kontrol_db::models::area::{Area, CreateNamed, Department, UpdateNamed};
use kontrol_db::repositories::{AreaRepo, DepartmentRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn area_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Area", id })
}

/// The area must belong to the caller's organization.
async fn ensure_area(state: &AppState, organization_id: DbId, area_id: DbId) -> AppResult<Area> {
    AreaRepo::find_by_id(&state.pool, organization_id, area_id)
        .await?
        .ok_or_else(|| area_not_found(area_id))
}

// ---------------------------------------------------------------------------
// Areas
// ---------------------------------------------------------------------------

/// GET /api/v1/areas
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Area>>>> {
    let org = user.organization_id()?;
    let areas = AreaRepo::list_by_organization(&state.pool, org).await?;
    Ok(Json(DataResponse { data: areas }))
}

/// POST /api/v1/areas
pub async fn create(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateNamed>,
) -> AppResult<(StatusCode, Json<DataResponse<Area>>)> {
    let org = user.organization_id()?;
    input.validate()?;
    let name = validate_name("name", &input.name)?;
    let area = AreaRepo::create(&state.pool, org, &name).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: area })))
}

/// PUT /api/v1/areas/{id}
pub async fn update(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNamed>,
) -> AppResult<Json<DataResponse<Area>>> {
    let org = user.organization_id()?;
    input.validate()?;
    validate_optional_name("name", input.name.as_deref())?;
    let area = AreaRepo::update(&state.pool, org, id, &input)
        .await?
        .ok_or_else(|| area_not_found(id))?;
    Ok(Json(DataResponse { data: area }))
}

/// DELETE /api/v1/areas/{id}
pub async fn deactivate(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let org = user.organization_id()?;
    if AreaRepo::deactivate(&state.pool, org, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(area_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

/// GET /api/v1/areas/{id}/departments
pub async fn list_departments(
    user: AuthUser,
    State(state): State<AppState>,
    Path(area_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Department>>>> {
    let org = user.organization_id()?;
    ensure_area(&state, org, area_id).await?;
    let departments = DepartmentRepo::list_by_area(&state.pool, area_id).await?;
    Ok(Json(DataResponse { data: departments }))
}

/// POST /api/v1/areas/{id}/departments
pub async fn create_department(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(area_id): Path<DbId>,
    Json(input): Json<CreateNamed>,
) -> AppResult<(StatusCode, Json<DataResponse<Department>>)> {
    let org = user.organization_id()?;
    input.validate()?;
    let name = validate_name("name", &input.name)?;
    ensure_area(&state, org, area_id).await?;
    let department = DepartmentRepo::create(&state.pool, area_id, &name).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}

/// PUT /api/v1/areas/{id}/departments/{department_id}
pub async fn update_department(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path((area_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateNamed>,
) -> AppResult<Json<DataResponse<Department>>> {
    let org = user.organization_id()?;
    input.validate()?;
    validate_optional_name("name", input.name.as_deref())?;
    ensure_area(&state, org, area_id).await?;
    let department = DepartmentRepo::update(&state.pool, area_id, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Department",
            id,
        }))?;
    Ok(Json(DataResponse { data: department }))
}

/// DELETE /api/v1/areas/{id}/departments/{department_id}
pub async fn deactivate_department(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path((area_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let org = user.organization_id()?;
    ensure_area(&state, org, area_id).await?;
    if DepartmentRepo::deactivate(&state.pool, area_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Department",
            id,
        }))
    }
}
