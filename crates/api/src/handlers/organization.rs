//! Handlers for the `/organizations` resource (superadmin only).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use kontrol_core::directory::{validate_name, validate_optional_name};
use kontrol_core::error::CoreError;
use kontrol_core::roles::ROLE_ADMIN;
use kontrol_core::types::DbId;
use kontrol_db::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use kontrol_db::repositories::OrganizationRepo;
use kontrol_events::{event_types, PlatformEvent};
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireSuperAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedOrganization {
    pub organization: Organization,
    pub admin_user_id: DbId,
}

/// POST /api/v1/organizations
///
/// Creates the organization together with its pending admin and announces
/// the admin invitation.
pub async fn create(
    RequireSuperAdmin(user): RequireSuperAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateOrganization>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedOrganization>>)> {
    input.validate()?;
    validate_name("name", &input.name)?;
    validate_name("admin_first_name", &input.admin_first_name)?;
    validate_name("admin_last_name", &input.admin_last_name)?;

    let (organization, admin) = OrganizationRepo::create_with_admin(&state.pool, &input).await?;
    tracing::info!(
        organization_id = organization.id,
        admin_user_id = admin.id,
        created_by = user.user_id,
        "Organization created"
    );

    state.event_bus.publish(
        PlatformEvent::new(event_types::USER_INVITED)
            .with_organization(organization.id)
            .with_source("user", admin.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "recipient_email": admin.email,
                "recipient_name": admin.display_name(),
                "role": ROLE_ADMIN,
                "organization_name": organization.name,
            })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedOrganization {
                admin_user_id: admin.id,
                organization,
            },
        }),
    ))
}

/// GET /api/v1/organizations
pub async fn list(
    RequireSuperAdmin(_): RequireSuperAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Organization>>>> {
    let organizations = OrganizationRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: organizations,
    }))
}

/// GET /api/v1/organizations/{id}
pub async fn get_by_id(
    RequireSuperAdmin(_): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Organization>>> {
    let organization = OrganizationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Organization",
            id,
        }))?;
    Ok(Json(DataResponse { data: organization }))
}

/// PUT /api/v1/organizations/{id}
pub async fn update(
    RequireSuperAdmin(_): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrganization>,
) -> AppResult<Json<DataResponse<Organization>>> {
    input.validate()?;
    validate_optional_name("name", input.name.as_deref())?;

    let organization = OrganizationRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Organization",
            id,
        }))?;
    Ok(Json(DataResponse { data: organization }))
}
