//! Organization (tenant) model and DTOs.

use kontrol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organization {
    pub id: DbId,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an organization together with its first (pending) admin.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganization {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub admin_first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub admin_last_name: String,
    #[validate(email)]
    pub admin_email: String,
}

/// DTO for updating an organization.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganization {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}
