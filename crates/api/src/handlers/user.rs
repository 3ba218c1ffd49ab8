//! Handlers for the `/users` resource (organization admins).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use kontrol_core::directory::validate_assignable_role;
use kontrol_core::error::CoreError;
use kontrol_core::types::DbId;
use kontrol_db::models::user::{InviteUser, UpdateUser, User};
use kontrol_db::repositories::{OrganizationRepo, UserRepo};
use kontrol_events::{event_types, PlatformEvent};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn user_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "User", id })
}

/// GET /api/v1/users
pub async fn list(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<User>>>> {
    let org = admin.organization_id()?;
    let users = UserRepo::list_by_organization(&state.pool, org).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<User>>> {
    let org = admin.organization_id()?;
    let user = UserRepo::find_by_id(&state.pool, org, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(Json(DataResponse { data: user }))
}

/// POST /api/v1/users/invite
///
/// Creates a pending user and publishes `user.invited`. Delivery of the
/// invitation is fire-and-forget.
pub async fn invite(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<InviteUser>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    let org = admin.organization_id()?;
    input.validate()?;
    validate_assignable_role(&input.role)?;

    let user = UserRepo::invite(&state.pool, org, &input).await?;
    let organization_name = OrganizationRepo::find_by_id(&state.pool, org)
        .await?
        .map(|o| o.name)
        .unwrap_or_default();
    tracing::info!(
        user_id = user.id,
        organization_id = org,
        role = %user.role,
        invited_by = admin.user_id,
        "User invited"
    );

    state.event_bus.publish(
        PlatformEvent::new(event_types::USER_INVITED)
            .with_organization(org)
            .with_source("user", user.id)
            .with_actor(admin.user_id)
            .with_payload(serde_json::json!({
                "recipient_email": user.email,
                "recipient_name": user.display_name(),
                "role": user.role,
                "organization_name": organization_name,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<User>>> {
    let org = admin.organization_id()?;
    input.validate()?;
    if let Some(role) = &input.role {
        validate_assignable_role(role)?;
    }
    let user = UserRepo::update(&state.pool, org, id, &input)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(Json(DataResponse { data: user }))
}
