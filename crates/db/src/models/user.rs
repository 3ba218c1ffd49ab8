//! User model and DTOs.
//!
//! Credentials live with the identity provider; this table only holds the
//! directory record that tokens refer to by id.

use kontrol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// User has been invited but not signed in yet.
pub const USER_STATUS_PENDING: &str = "pending";

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub organization_id: Option<DbId>,
    pub department_id: Option<DbId>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// DTO for inviting a user into the caller's organization.
#[derive(Debug, Deserialize, Validate)]
pub struct InviteUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub role: String,
    pub department_id: Option<DbId>,
}

/// DTO for updating a user. All fields optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub role: Option<String>,
    pub department_id: Option<DbId>,
    pub is_active: Option<bool>,
}
