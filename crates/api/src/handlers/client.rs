//! Handlers for the `/clients` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use kontrol_core::directory::{validate_name, validate_optional_name};
use kontrol_core::error::CoreError;
use kontrol_core::types::DbId;
use kontrol_db::models::client::{Client, CreateClient, UpdateClient};
use kontrol_db::repositories::ClientRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn client_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Client",
        id,
    })
}

/// GET /api/v1/clients
pub async fn list(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Client>>>> {
    let org = admin.organization_id()?;
    let clients = ClientRepo::list_by_organization(&state.pool, org).await?;
    Ok(Json(DataResponse { data: clients }))
}

/// POST /api/v1/clients
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateClient>,
) -> AppResult<(StatusCode, Json<DataResponse<Client>>)> {
    let org = admin.organization_id()?;
    input.validate()?;
    validate_name("client_name", &input.client_name)?;
    validate_name("company_name", &input.company_name)?;
    let client = ClientRepo::create(&state.pool, org, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: client })))
}

/// GET /api/v1/clients/{id}
pub async fn get_by_id(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Client>>> {
    let org = admin.organization_id()?;
    let client = ClientRepo::find_by_id(&state.pool, org, id)
        .await?
        .ok_or_else(|| client_not_found(id))?;
    Ok(Json(DataResponse { data: client }))
}

/// PUT /api/v1/clients/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateClient>,
) -> AppResult<Json<DataResponse<Client>>> {
    let org = admin.organization_id()?;
    input.validate()?;
    validate_optional_name("client_name", input.client_name.as_deref())?;
    validate_optional_name("company_name", input.company_name.as_deref())?;
    let client = ClientRepo::update(&state.pool, org, id, &input)
        .await?
        .ok_or_else(|| client_not_found(id))?;
    Ok(Json(DataResponse { data: client }))
}

/// DELETE /api/v1/clients/{id}
pub async fn deactivate(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let org = admin.organization_id()?;
    if ClientRepo::deactivate(&state.pool, org, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(client_not_found(id))
    }
}
