//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireSuperAdmin`] -- Requires the `superadmin` role.
//! - [`rbac::RequireAdmin`] -- Requires `admin` or `superadmin`.
//! - [`rbac::RequireInspector`] -- Requires `inspector`, `admin` or `superadmin`.

pub mod auth;
pub mod rbac;
