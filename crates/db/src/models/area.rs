//! Area and department models and DTOs.

use kontrol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `areas` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Area {
    pub id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `departments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: DbId,
    pub area_id: DbId,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an area or a department.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNamed {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// DTO for renaming or (re)activating an area or department.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNamed {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}
