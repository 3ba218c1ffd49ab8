//! Repository for the `users` table.

use kontrol_core::directory::normalize_email;
use kontrol_core::roles::ROLE_ADMIN;
use kontrol_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{InviteUser, UpdateUser, User};

/// Column list for `users` queries.
pub(crate) const USER_COLUMNS: &str = "\
    id, organization_id, department_id, email, first_name, last_name, \
    phone, role, status, is_active, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Create a pending user in `organization_id`.
    pub async fn invite(
        pool: &PgPool,
        organization_id: DbId,
        input: &InviteUser,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users \
                (organization_id, department_id, email, first_name, last_name, role) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(organization_id)
            .bind(input.department_id)
            .bind(normalize_email(&input.email))
            .bind(input.first_name.trim())
            .bind(input.last_name.trim())
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    /// Find a user in `organization_id` by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND organization_id = $2");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// List the users of an organization ordered by last, then first name.
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE organization_id = $1 \
             ORDER BY last_name, first_name"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Active administrators of an organization, who receive report
    /// notifications.
    pub async fn list_active_admins(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE organization_id = $1 AND role = $2 AND is_active = true \
             ORDER BY last_name, first_name"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(organization_id)
            .bind(ROLE_ADMIN)
            .fetch_all(pool)
            .await
    }

    /// Update a user. Returns `None` if not found in `organization_id`.
    pub async fn update(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET \
                 first_name = COALESCE($3, first_name), \
                 last_name = COALESCE($4, last_name), \
                 phone = COALESCE($5, phone), \
                 role = COALESCE($6, role), \
                 department_id = COALESCE($7, department_id), \
                 is_active = COALESCE($8, is_active) \
             WHERE id = $1 AND organization_id = $2 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(organization_id)
            .bind(input.first_name.as_deref().map(str::trim))
            .bind(input.last_name.as_deref().map(str::trim))
            .bind(&input.phone)
            .bind(&input.role)
            .bind(input.department_id)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }
}
