//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use kontrol_core::error::CoreError;
use kontrol_core::roles;
use kontrol_core::session::Inspector;
use kontrol_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     let org = user.organization_id()?;
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub display_name: String,
    pub role: String,
    /// Tenant from the `org` claim.
    pub organization: Option<DbId>,
}

impl AuthUser {
    /// The acting inspector passed into session operations.
    pub fn inspector(&self) -> Inspector {
        Inspector {
            user_id: self.user_id,
            display_name: self.display_name.clone(),
        }
    }

    /// Tenant of the caller. Tokens without an organization are rejected
    /// from tenant routes with 403.
    pub fn organization_id(&self) -> Result<DbId, AppError> {
        self.organization.ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "This operation requires an organization".into(),
            ))
        })
    }

    pub fn is_admin(&self) -> bool {
        roles::is_admin(&self.role)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            display_name: claims.name,
            role: claims.role,
            organization: claims.org,
        })
    }
}
