//! Repositories for the `areas` and `departments` tables.
//!
//! Deleting an area or department only clears `is_active`; historical
//! controls and reports keep their references.

use kontrol_core::types::DbId;
use sqlx::PgPool;

use crate::models::area::{Area, Department, UpdateNamed};

const AREA_COLUMNS: &str = "id, organization_id, name, is_active, created_at, updated_at";
const DEPARTMENT_COLUMNS: &str = "id, area_id, name, is_active, created_at, updated_at";

/// Provides CRUD operations for areas.
pub struct AreaRepo;

impl AreaRepo {
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        name: &str,
    ) -> Result<Area, sqlx::Error> {
        let query = format!(
            "INSERT INTO areas (organization_id, name) VALUES ($1, $2) RETURNING {AREA_COLUMNS}"
        );
        sqlx::query_as::<_, Area>(&query)
            .bind(organization_id)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<Option<Area>, sqlx::Error> {
        let query =
            format!("SELECT {AREA_COLUMNS} FROM areas WHERE id = $1 AND organization_id = $2");
        sqlx::query_as::<_, Area>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// List an organization's areas ordered by name.
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<Area>, sqlx::Error> {
        let query = format!(
            "SELECT {AREA_COLUMNS} FROM areas WHERE organization_id = $1 ORDER BY name"
        );
        sqlx::query_as::<_, Area>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
        input: &UpdateNamed,
    ) -> Result<Option<Area>, sqlx::Error> {
        let query = format!(
            "UPDATE areas SET \
                 name = COALESCE($3, name), \
                 is_active = COALESCE($4, is_active) \
             WHERE id = $1 AND organization_id = $2 \
             RETURNING {AREA_COLUMNS}"
        );
        sqlx::query_as::<_, Area>(&query)
            .bind(id)
            .bind(organization_id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate an area. Returns `true` if a row was updated.
    pub async fn deactivate(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE areas SET is_active = false WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Provides CRUD operations for departments. Every call is scoped through
/// the parent area's organization.
pub struct DepartmentRepo;

impl DepartmentRepo {
    pub async fn create(pool: &PgPool, area_id: DbId, name: &str) -> Result<Department, sqlx::Error> {
        let query = format!(
            "INSERT INTO departments (area_id, name) VALUES ($1, $2) \
             RETURNING {DEPARTMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(area_id)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    pub async fn list_by_area(pool: &PgPool, area_id: DbId) -> Result<Vec<Department>, sqlx::Error> {
        let query = format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE area_id = $1 ORDER BY name"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(area_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        area_id: DbId,
        id: DbId,
        input: &UpdateNamed,
    ) -> Result<Option<Department>, sqlx::Error> {
        let query = format!(
            "UPDATE departments SET \
                 name = COALESCE($3, name), \
                 is_active = COALESCE($4, is_active) \
             WHERE id = $1 AND area_id = $2 \
             RETURNING {DEPARTMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .bind(area_id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a department. Returns `true` if a row was updated.
    pub async fn deactivate(pool: &PgPool, area_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE departments SET is_active = false WHERE id = $1 AND area_id = $2")
                .bind(id)
                .bind(area_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
