//! Repository for `master_controls` and their `control_items`.

use kontrol_core::controls::ControlStatus;
use kontrol_core::schedule::ControlInterval;
use kontrol_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::control::{
    ControlItem, ControlItemInput, ControlListParams, ControlWithItems, CreateControl,
    MasterControl, ScheduleRow, UpdateControl,
};

/// Column list for `master_controls` queries.
const COLUMNS: &str = "\
    id, organization_id, area_id, department_id, name, inspection_type, \
    control_interval, buffer_days, status, qr_code, location, asset_name, \
    created_at, updated_at";

/// Column list for `control_items` queries.
const ITEM_COLUMNS: &str = "\
    id, control_id, item_key, name, priority, instructions, sort_order, \
    created_at, updated_at";

/// Provides CRUD operations for master controls.
pub struct ControlRepo;

impl ControlRepo {
    /// Create a control and its ordered items in one transaction.
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        qr_code: &str,
        input: &CreateControl,
    ) -> Result<ControlWithItems, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO master_controls \
                (organization_id, area_id, department_id, name, inspection_type, \
                 control_interval, buffer_days, status, qr_code, location, asset_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        let control = sqlx::query_as::<_, MasterControl>(&query)
            .bind(organization_id)
            .bind(input.area_id)
            .bind(input.department_id)
            .bind(input.name.trim())
            .bind(input.inspection_type.trim())
            .bind(input.interval.as_str())
            .bind(input.buffer_days)
            .bind(input.status.as_str())
            .bind(qr_code)
            .bind(&input.location)
            .bind(&input.asset_name)
            .fetch_one(&mut *tx)
            .await?;

        let items = Self::insert_items(&mut tx, control.id, &input.items).await?;
        tx.commit().await?;
        Ok(ControlWithItems { control, items })
    }

    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<Option<MasterControl>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM master_controls WHERE id = $1 AND organization_id = $2"
        );
        sqlx::query_as::<_, MasterControl>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a control by its QR token within an organization.
    pub async fn find_by_qr_code(
        pool: &PgPool,
        organization_id: DbId,
        qr_code: &str,
    ) -> Result<Option<MasterControl>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM master_controls WHERE qr_code = $1 AND organization_id = $2"
        );
        sqlx::query_as::<_, MasterControl>(&query)
            .bind(qr_code)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// Items of a control in checklist order.
    pub async fn find_items(pool: &PgPool, control_id: DbId) -> Result<Vec<ControlItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM control_items WHERE control_id = $1 ORDER BY sort_order"
        );
        sqlx::query_as::<_, ControlItem>(&query)
            .bind(control_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_with_items(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<Option<ControlWithItems>, sqlx::Error> {
        let Some(control) = Self::find_by_id(pool, organization_id, id).await? else {
            return Ok(None);
        };
        let items = Self::find_items(pool, control.id).await?;
        Ok(Some(ControlWithItems { control, items }))
    }

    /// List controls with optional filters, ordered by name.
    pub async fn list(
        pool: &PgPool,
        organization_id: DbId,
        params: &ControlListParams,
    ) -> Result<Vec<MasterControl>, sqlx::Error> {
        let mut conditions = vec!["organization_id = $1".to_string()];
        let mut param_idx: usize = 2;

        if params.status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
            param_idx += 1;
        }
        if params.area_id.is_some() {
            conditions.push(format!("area_id = ${param_idx}"));
            param_idx += 1;
        }
        if params.department_id.is_some() {
            conditions.push(format!("department_id = ${param_idx}"));
        }

        let query = format!(
            "SELECT {COLUMNS} FROM master_controls WHERE {} ORDER BY name",
            conditions.join(" AND ")
        );
        let mut q = sqlx::query_as::<_, MasterControl>(&query).bind(organization_id);
        if let Some(status) = params.status {
            q = q.bind(status.as_str());
        }
        if let Some(area_id) = params.area_id {
            q = q.bind(area_id);
        }
        if let Some(department_id) = params.department_id {
            q = q.bind(department_id);
        }
        q.fetch_all(pool).await
    }

    /// Update header fields. Returns `None` if not found.
    pub async fn update(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
        input: &UpdateControl,
    ) -> Result<Option<MasterControl>, sqlx::Error> {
        let query = format!(
            "UPDATE master_controls SET \
                 name = COALESCE($3, name), \
                 inspection_type = COALESCE($4, inspection_type), \
                 control_interval = COALESCE($5, control_interval), \
                 buffer_days = COALESCE($6, buffer_days), \
                 status = COALESCE($7, status), \
                 area_id = COALESCE($8, area_id), \
                 department_id = COALESCE($9, department_id), \
                 location = COALESCE($10, location), \
                 asset_name = COALESCE($11, asset_name) \
             WHERE id = $1 AND organization_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MasterControl>(&query)
            .bind(id)
            .bind(organization_id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.inspection_type.as_deref().map(str::trim))
            .bind(input.interval.map(ControlInterval::as_str))
            .bind(input.buffer_days)
            .bind(input.status.map(ControlStatus::as_str))
            .bind(input.area_id)
            .bind(input.department_id)
            .bind(&input.location)
            .bind(&input.asset_name)
            .fetch_optional(pool)
            .await
    }

    /// Replace a control's checklist. Sessions already started keep their
    /// own copy of the previous items.
    pub async fn replace_items(
        pool: &PgPool,
        control_id: DbId,
        items: &[ControlItemInput],
    ) -> Result<Vec<ControlItem>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM control_items WHERE control_id = $1")
            .bind(control_id)
            .execute(&mut *tx)
            .await?;
        let rows = Self::insert_items(&mut tx, control_id, items).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Set status to `inactive`. Returns `true` if a row was updated.
    pub async fn deactivate(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE master_controls SET status = 'inactive' \
             WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active controls with the completion time of their latest report.
    pub async fn list_for_schedule(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<ScheduleRow>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleRow>(
            "SELECT c.id, c.name, c.control_interval, c.buffer_days, c.created_at, \
                    MAX(r.completed_at) AS last_completed \
             FROM master_controls c \
             LEFT JOIN inspection_reports r ON r.control_id = c.id \
             WHERE c.organization_id = $1 AND c.status = 'active' \
             GROUP BY c.id",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        control_id: DbId,
        items: &[ControlItemInput],
    ) -> Result<Vec<ControlItem>, sqlx::Error> {
        let query = format!(
            "INSERT INTO control_items \
                (control_id, item_key, name, priority, instructions, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ITEM_COLUMNS}"
        );
        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let row = sqlx::query_as::<_, ControlItem>(&query)
                .bind(control_id)
                .bind(item.item_key.trim())
                .bind(item.name.trim())
                .bind(item.priority.as_str())
                .bind(item.instructions.as_deref().unwrap_or_default())
                .bind(index as i32)
                .fetch_one(&mut **tx)
                .await?;
            rows.push(row);
        }
        Ok(rows)
    }
}
