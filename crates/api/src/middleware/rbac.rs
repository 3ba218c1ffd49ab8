//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement with 403 Forbidden.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use kontrol_core::error::CoreError;
use kontrol_core::roles::{can_inspect, is_admin, ROLE_SUPERADMIN};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `superadmin` role.
pub struct RequireSuperAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_SUPERADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Superadmin role required".into(),
            )));
        }
        Ok(RequireSuperAdmin(user))
    }
}

/// Requires `admin` or `superadmin`.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !is_admin(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires a role that may perform inspections.
pub struct RequireInspector(pub AuthUser);

impl FromRequestParts<AppState> for RequireInspector {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !can_inspect(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Inspector or Admin role required".into(),
            )));
        }
        Ok(RequireInspector(user))
    }
}
