//! Persistence contract for the inspection workflow.
//!
//! [`InspectionStore`] is implemented by the PostgreSQL store in
//! `kontrol-db` and by [`MemoryInspectionStore`] for tests and local runs.
//! Session writes use optimistic concurrency: every save names the version
//! it was based on and fails with [`StoreError::VersionConflict`] when a
//! concurrent writer got there first.

mod memory;

use async_trait::async_trait;

pub use memory::MemoryInspectionStore;

use crate::checklist::ChecklistItemDefinition;
use crate::follow_up::FollowUp;
use crate::report::{InspectionReport, ReportRecord};
use crate::session::{InspectionSession, Inspector, SessionContext, SessionDraft};
use crate::types::DbId;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Inspection session {session_id} was modified concurrently (expected version {expected})")]
    VersionConflict { session_id: DbId, expected: i64 },

    #[error("Inspection session {session_id} is locked")]
    SessionLocked { session_id: DbId },

    #[error("Follow-up of report {report_id} is already resolved")]
    FollowUpResolved { report_id: DbId },

    #[error("Invalid persisted value: {0}")]
    InvalidPersistedValue(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// A master control's ordered checklist plus the context copied into
/// sessions started from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistTemplate {
    pub control_id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub asset_name: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub items: Vec<ChecklistItemDefinition>,
}

impl ChecklistTemplate {
    pub fn session_context(&self, inspector: Inspector) -> SessionContext {
        SessionContext {
            organization_id: self.organization_id,
            control_id: self.control_id,
            control_name: self.name.clone(),
            asset_name: self.asset_name.clone(),
            location: self.location.clone(),
            inspector,
        }
    }
}

#[async_trait]
pub trait InspectionStore: Send + Sync {
    /// Ordered item definitions of a control in `organization_id`.
    async fn load_checklist_template(
        &self,
        organization_id: DbId,
        control_id: DbId,
    ) -> StoreResult<ChecklistTemplate>;

    /// Control id for a QR token, scoped to one organization.
    async fn find_control_by_qr_code(
        &self,
        organization_id: DbId,
        qr_code: &str,
    ) -> StoreResult<DbId>;

    /// Persist a new session at version 1.
    async fn create_session(&self, draft: SessionDraft) -> StoreResult<InspectionSession>;

    async fn load_session(
        &self,
        organization_id: DbId,
        session_id: DbId,
    ) -> StoreResult<InspectionSession>;

    /// Write an unlocked session whose stored version equals
    /// `session.version()`. Returns the new version.
    async fn save_session(&self, session: &InspectionSession) -> StoreResult<i64>;

    /// Atomically lock the stored session (same version check as
    /// [`save_session`](Self::save_session)) and insert its report.
    /// Called exactly once per finalized session.
    async fn save_report(
        &self,
        session: &InspectionSession,
        report: &InspectionReport,
    ) -> StoreResult<DbId>;

    async fn load_report(&self, organization_id: DbId, report_id: DbId)
        -> StoreResult<ReportRecord>;

    /// Replace the follow-up sidecar of a report. Last writer wins among
    /// edits, but a stored resolution is never overwritten: writing over a
    /// resolved follow-up fails with [`StoreError::FollowUpResolved`].
    async fn save_follow_up(&self, report_id: DbId, follow_up: &FollowUp) -> StoreResult<()>;
}
