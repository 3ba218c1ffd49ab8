//! Master control (checklist template) models and DTOs.

use kontrol_core::checklist::{ChecklistItemDefinition, ItemId, Priority};
use kontrol_core::controls::ControlStatus;
use kontrol_core::schedule::ControlInterval;
use kontrol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `master_controls` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MasterControl {
    pub id: DbId,
    pub organization_id: DbId,
    pub area_id: Option<DbId>,
    pub department_id: Option<DbId>,
    pub name: String,
    pub inspection_type: String,
    #[serde(rename = "interval")]
    pub control_interval: String,
    pub buffer_days: i32,
    pub status: String,
    pub qr_code: String,
    pub location: Option<String>,
    pub asset_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `control_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ControlItem {
    pub id: DbId,
    pub control_id: DbId,
    pub item_key: String,
    pub name: String,
    pub priority: String,
    pub instructions: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A control with its ordered items.
#[derive(Debug, Clone, Serialize)]
pub struct ControlWithItems {
    #[serde(flatten)]
    pub control: MasterControl,
    pub items: Vec<ControlItem>,
}

/// One checklist item in a create/replace payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ControlItemInput {
    #[validate(length(min = 1, max = 100))]
    pub item_key: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    pub instructions: Option<String>,
}

impl ControlItemInput {
    /// Domain definition of this item under a control's schedule settings.
    pub fn to_definition(&self, interval: ControlInterval, buffer_days: u32) -> ChecklistItemDefinition {
        ChecklistItemDefinition {
            id: ItemId::new(self.item_key.trim()),
            name: self.name.trim().to_string(),
            priority: self.priority,
            instructions: self.instructions.clone().unwrap_or_default(),
            interval,
            buffer_days,
        }
    }
}

/// DTO for creating a master control.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateControl {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub inspection_type: String,
    pub interval: ControlInterval,
    pub buffer_days: i32,
    #[serde(default)]
    pub status: ControlStatus,
    pub area_id: Option<DbId>,
    pub department_id: Option<DbId>,
    pub location: Option<String>,
    pub asset_name: Option<String>,
    #[validate(nested)]
    pub items: Vec<ControlItemInput>,
}

/// DTO for updating a master control's header fields.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateControl {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub inspection_type: Option<String>,
    pub interval: Option<ControlInterval>,
    pub buffer_days: Option<i32>,
    pub status: Option<ControlStatus>,
    pub area_id: Option<DbId>,
    pub department_id: Option<DbId>,
    pub location: Option<String>,
    pub asset_name: Option<String>,
}

/// DTO replacing a control's checklist.
#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceControlItems {
    #[validate(nested)]
    pub items: Vec<ControlItemInput>,
}

/// Query parameters for listing controls.
#[derive(Debug, Deserialize)]
pub struct ControlListParams {
    pub status: Option<ControlStatus>,
    pub area_id: Option<DbId>,
    pub department_id: Option<DbId>,
}

/// Columns needed to compute a control's schedule.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduleRow {
    pub id: DbId,
    pub name: String,
    pub control_interval: String,
    pub buffer_days: i32,
    pub created_at: Timestamp,
    pub last_completed: Option<Timestamp>,
}
