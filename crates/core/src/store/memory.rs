use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ChecklistTemplate, InspectionStore, StoreError, StoreResult};
use crate::follow_up::FollowUp;
use crate::report::{InspectionReport, ReportRecord};
use crate::session::{InspectionSession, SessionDraft};
use crate::types::DbId;

/// Process-local [`InspectionStore`] backed by hash maps.
#[derive(Debug, Default)]
pub struct MemoryInspectionStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    templates: HashMap<DbId, ChecklistTemplate>,
    qr_codes: HashMap<(DbId, String), DbId>,
    sessions: HashMap<DbId, InspectionSession>,
    reports: HashMap<DbId, ReportRecord>,
    next_session_id: DbId,
    next_report_id: DbId,
}

impl MemoryInspectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template and the QR token that resolves to it.
    pub async fn insert_template(&self, template: ChecklistTemplate, qr_code: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.qr_codes.insert(
            (template.organization_id, qr_code.into()),
            template.control_id,
        );
        inner.templates.insert(template.control_id, template);
    }
}

impl StoreInner {
    /// The stored copy of `session`, checked for lock state and version.
    fn writable_session(&self, session: &InspectionSession) -> StoreResult<&InspectionSession> {
        let stored = self
            .sessions
            .get(&session.id())
            .ok_or_else(|| StoreError::not_found("inspection session", session.id()))?;
        if stored.is_locked() {
            return Err(StoreError::SessionLocked {
                session_id: session.id(),
            });
        }
        if stored.version() != session.version() {
            return Err(StoreError::VersionConflict {
                session_id: session.id(),
                expected: session.version(),
            });
        }
        Ok(stored)
    }
}

#[async_trait]
impl InspectionStore for MemoryInspectionStore {
    async fn load_checklist_template(
        &self,
        organization_id: DbId,
        control_id: DbId,
    ) -> StoreResult<ChecklistTemplate> {
        let inner = self.inner.read().await;
        inner
            .templates
            .get(&control_id)
            .filter(|t| t.organization_id == organization_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("master control", control_id))
    }

    async fn find_control_by_qr_code(
        &self,
        organization_id: DbId,
        qr_code: &str,
    ) -> StoreResult<DbId> {
        let inner = self.inner.read().await;
        inner
            .qr_codes
            .get(&(organization_id, qr_code.to_string()))
            .copied()
            .ok_or_else(|| StoreError::not_found("master control", qr_code))
    }

    async fn create_session(&self, draft: SessionDraft) -> StoreResult<InspectionSession> {
        let mut inner = self.inner.write().await;
        inner.next_session_id += 1;
        let session = draft.into_session(inner.next_session_id);
        inner.sessions.insert(session.id(), session.clone());
        Ok(session)
    }

    async fn load_session(
        &self,
        organization_id: DbId,
        session_id: DbId,
    ) -> StoreResult<InspectionSession> {
        let inner = self.inner.read().await;
        inner
            .sessions
            .get(&session_id)
            .filter(|s| s.context().organization_id == organization_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("inspection session", session_id))
    }

    async fn save_session(&self, session: &InspectionSession) -> StoreResult<i64> {
        if session.is_locked() {
            return Err(StoreError::SessionLocked {
                session_id: session.id(),
            });
        }
        let mut inner = self.inner.write().await;
        let version = inner.writable_session(session)?.version() + 1;
        let mut stored = session.clone();
        stored.set_version(version);
        inner.sessions.insert(stored.id(), stored);
        Ok(version)
    }

    async fn save_report(
        &self,
        session: &InspectionSession,
        report: &InspectionReport,
    ) -> StoreResult<DbId> {
        let mut inner = self.inner.write().await;
        let version = inner.writable_session(session)?.version() + 1;

        let mut stored = session.clone();
        stored.set_version(version);
        inner.sessions.insert(stored.id(), stored);

        inner.next_report_id += 1;
        let id = inner.next_report_id;
        inner.reports.insert(
            id,
            ReportRecord {
                id,
                report: report.clone(),
            },
        );
        Ok(id)
    }

    async fn load_report(
        &self,
        organization_id: DbId,
        report_id: DbId,
    ) -> StoreResult<ReportRecord> {
        let inner = self.inner.read().await;
        inner
            .reports
            .get(&report_id)
            .filter(|r| r.report.organization_id() == organization_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("inspection report", report_id))
    }

    async fn save_follow_up(&self, report_id: DbId, follow_up: &FollowUp) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .reports
            .get_mut(&report_id)
            .ok_or_else(|| StoreError::not_found("inspection report", report_id))?;
        let slot = record.report.follow_up_mut().ok_or_else(|| {
            StoreError::InvalidPersistedValue(format!("report {report_id} has no follow-up"))
        })?;
        if slot.resolved {
            return Err(StoreError::FollowUpResolved { report_id });
        }
        *slot = follow_up.clone();
        Ok(())
    }
}
