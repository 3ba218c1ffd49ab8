//! Repository for the `organizations` table.

use kontrol_core::directory::normalize_email;
use kontrol_core::roles::ROLE_ADMIN;
use kontrol_core::types::DbId;
use sqlx::PgPool;

use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use crate::models::user::User;
use crate::repositories::user_repo::USER_COLUMNS;

/// Column list for `organizations` queries.
const COLUMNS: &str = "id, name, is_active, created_at, updated_at";

/// Provides CRUD operations for organizations.
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// Create an organization and its pending admin in one transaction.
    pub async fn create_with_admin(
        pool: &PgPool,
        input: &CreateOrganization,
    ) -> Result<(Organization, User), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("INSERT INTO organizations (name) VALUES ($1) RETURNING {COLUMNS}");
        let org = sqlx::query_as::<_, Organization>(&query)
            .bind(input.name.trim())
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO users (organization_id, email, first_name, last_name, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        let admin = sqlx::query_as::<_, User>(&query)
            .bind(org.id)
            .bind(normalize_email(&input.admin_email))
            .bind(input.admin_first_name.trim())
            .bind(input.admin_last_name.trim())
            .bind(ROLE_ADMIN)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((org, admin))
    }

    /// Find an organization by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Organization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE id = $1");
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all organizations ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Organization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations ORDER BY name");
        sqlx::query_as::<_, Organization>(&query)
            .fetch_all(pool)
            .await
    }

    /// Update an organization. Returns `None` if no row with `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let query = format!(
            "UPDATE organizations SET \
                 name = COALESCE($2, name), \
                 is_active = COALESCE($3, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }
}
