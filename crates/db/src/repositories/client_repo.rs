//! Repository for the `clients` table.

use kontrol_core::directory::normalize_email;
use kontrol_core::types::DbId;
use sqlx::PgPool;

use crate::models::client::{Client, CreateClient, UpdateClient};

/// Column list for `clients` queries.
const COLUMNS: &str = "\
    id, organization_id, client_name, email, company_name, phone, \
    is_active, created_at, updated_at";

/// Provides CRUD operations for clients.
pub struct ClientRepo;

impl ClientRepo {
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        input: &CreateClient,
    ) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients (organization_id, client_name, email, company_name, phone) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(organization_id)
            .bind(input.client_name.trim())
            .bind(normalize_email(&input.email))
            .bind(input.company_name.trim())
            .bind(&input.phone)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1 AND organization_id = $2");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// List active clients ordered by company, then contact name.
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<Client>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM clients \
             WHERE organization_id = $1 AND is_active = true \
             ORDER BY company_name, client_name"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
        input: &UpdateClient,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET \
                 client_name = COALESCE($3, client_name), \
                 email = COALESCE($4, email), \
                 company_name = COALESCE($5, company_name), \
                 phone = COALESCE($6, phone), \
                 is_active = COALESCE($7, is_active) \
             WHERE id = $1 AND organization_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(organization_id)
            .bind(input.client_name.as_deref().map(str::trim))
            .bind(input.email.as_deref().map(normalize_email))
            .bind(input.company_name.as_deref().map(str::trim))
            .bind(&input.phone)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a client. Returns `true` if a row was updated.
    pub async fn deactivate(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE clients SET is_active = false WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
