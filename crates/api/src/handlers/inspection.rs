//! Handlers for the `/inspections` resource: starting sessions, walking the
//! checklist, attaching photos and finalizing into a report.
//!
//! Every mutation loads the session from the store, applies the change to
//! the domain value and saves it back with the version it was loaded at.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use kontrol_core::checklist::{ChecklistItemResult, ItemId, ItemStatus};
use kontrol_core::error::{CoreError, InspectionError};
use kontrol_core::photos::{validate_upload, PhotoRef, PhotoUpload};
use kontrol_core::report::{finalize as finalize_session, ReportRecord};
use kontrol_core::session::{
    Direction, InspectionSession, ItemUpdate, Progress, SessionDraft,
};
use kontrol_core::store::StoreError;
use kontrol_core::types::DbId;
use kontrol_events::event_types;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::report::publish_report_event;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireInspector;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StartInspection {
    pub control_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub qr_code: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub status: Option<ItemStatus>,
    pub notes: Option<String>,
}

/// A session plus the derived values the inspection screen renders.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: InspectionSession,
    pub current_item: ChecklistItemResult,
    pub progress: Progress,
    pub is_complete: bool,
    pub unresolved_item_ids: Vec<ItemId>,
}

impl From<InspectionSession> for SessionView {
    fn from(session: InspectionSession) -> Self {
        Self {
            current_item: session.current_item().clone(),
            progress: session.progress(),
            is_complete: session.is_complete(),
            unresolved_item_ids: session.unresolved_item_ids(),
            session,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhotoUploaded {
    pub photo_ref: PhotoRef,
    pub session: SessionView,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a session of the caller's organization that the caller may act on:
/// its own inspector, or an admin of the organization.
async fn load_for(
    state: &AppState,
    user: &AuthUser,
    session_id: DbId,
) -> AppResult<InspectionSession> {
    let org = user.organization_id()?;
    let session = state.store.load_session(org, session_id).await?;
    if session.inspector().user_id != user.user_id && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the session's inspector or an admin may access it".into(),
        )));
    }
    Ok(session)
}

/// Persist a mutated session and adopt the new version.
async fn save(state: &AppState, session: &mut InspectionSession) -> AppResult<()> {
    let version = state.store.save_session(session).await?;
    session.set_version(version);
    Ok(())
}

async fn start_session(
    state: &AppState,
    user: &AuthUser,
    control_id: DbId,
) -> AppResult<(StatusCode, Json<DataResponse<SessionView>>)> {
    let org = user.organization_id()?;
    let template = state.store.load_checklist_template(org, control_id).await?;
    if !template.is_active {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "MasterControl {control_id} is not active"
        ))));
    }

    let draft = SessionDraft::new(
        template.session_context(user.inspector()),
        &template.items,
        Utc::now(),
    )?;
    let session = state.store.create_session(draft).await?;
    tracing::info!(
        session_id = session.id(),
        control_id,
        user_id = user.user_id,
        items = session.items().len(),
        "Inspection session started"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: session.into(),
        }),
    ))
}

async fn read_photo_field(multipart: &mut Multipart) -> AppResult<PhotoUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok(PhotoUpload {
            content_type,
            data: data.to_vec(),
        });
    }
    Err(AppError::BadRequest("Missing required 'file' field".into()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/inspections
pub async fn start(
    RequireInspector(user): RequireInspector,
    State(state): State<AppState>,
    Json(input): Json<StartInspection>,
) -> AppResult<(StatusCode, Json<DataResponse<SessionView>>)> {
    start_session(&state, &user, input.control_id).await
}

/// POST /api/v1/inspections/scan
pub async fn scan(
    RequireInspector(user): RequireInspector,
    State(state): State<AppState>,
    Json(input): Json<ScanRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SessionView>>)> {
    let org = user.organization_id()?;
    let qr_code = input.qr_code.trim();
    if qr_code.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "qr_code must not be blank".into(),
        )));
    }
    let control_id = state.store.find_control_by_qr_code(org, qr_code).await?;
    start_session(&state, &user, control_id).await
}

/// GET /api/v1/inspections/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let session = load_for(&state, &user, id).await?;
    Ok(Json(DataResponse {
        data: session.into(),
    }))
}

/// POST /api/v1/inspections/{id}/advance
pub async fn advance(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AdvanceRequest>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let mut session = load_for(&state, &user, id).await?;
    let before = session.cursor();
    if session.advance(input.direction) != before {
        save(&state, &mut session).await?;
    }
    Ok(Json(DataResponse {
        data: session.into(),
    }))
}

/// PUT /api/v1/inspections/{id}/items/{item_id}
pub async fn update_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, String)>,
    Json(input): Json<UpdateItemRequest>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let mut session = load_for(&state, &user, id).await?;
    let item_id = ItemId::new(item_id);
    session.resolve_item(
        &item_id,
        ItemUpdate {
            status: input.status,
            notes: input.notes,
            photo: None,
        },
        state.config.max_photos_per_item,
    )?;
    save(&state, &mut session).await?;
    tracing::debug!(session_id = id, item_id = %item_id, "Checklist item updated");
    Ok(Json(DataResponse {
        data: session.into(),
    }))
}

/// POST /api/v1/inspections/{id}/items/{item_id}/photos
///
/// Multipart upload with a `file` field. The item's photo bound is checked
/// before anything is written to storage.
pub async fn upload_photo(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, String)>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<PhotoUploaded>>)> {
    let upload = read_photo_field(&mut multipart).await?;
    validate_upload(&upload, state.config.max_photo_bytes)?;

    let mut session = load_for(&state, &user, id).await?;
    let item_id = ItemId::new(item_id);
    let max = state.config.max_photos_per_item;
    if session.is_locked() {
        return Err(InspectionError::SessionLocked { session_id: id }.into());
    }
    let item = session
        .item(&item_id)
        .ok_or_else(|| InspectionError::UnknownItem(item_id.clone()))?;
    if item.photo_slots_full(max) {
        return Err(InspectionError::PhotoLimitReached {
            item_id: item_id.clone(),
            max,
        }
        .into());
    }

    let photo_ref = state.photos.store(upload).await?;
    let attached = session
        .resolve_item(
            &item_id,
            ItemUpdate {
                photo: Some(photo_ref.clone()),
                ..Default::default()
            },
            max,
        )
        .map(|_| ());
    let saved = match attached {
        Ok(()) => save(&state, &mut session).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = saved {
        if let Err(cleanup) = state.photos.delete(&photo_ref).await {
            tracing::warn!(error = %cleanup, photo = %photo_ref, "Failed to remove orphaned photo");
        }
        return Err(e);
    }

    tracing::info!(session_id = id, item_id = %item_id, photo = %photo_ref, "Photo attached");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PhotoUploaded {
                photo_ref,
                session: session.into(),
            },
        }),
    ))
}

/// DELETE /api/v1/inspections/{id}/items/{item_id}/photos/{photo_ref}
pub async fn delete_photo(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, item_id, photo_ref)): Path<(DbId, String, String)>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let mut session = load_for(&state, &user, id).await?;
    let photo_ref = PhotoRef::new(photo_ref);
    if !session.remove_photo(&ItemId::new(item_id), &photo_ref)? {
        return Err(StoreError::not_found("photo", &photo_ref).into());
    }
    save(&state, &mut session).await?;

    if let Err(e) = state.photos.delete(&photo_ref).await {
        tracing::warn!(error = %e, photo = %photo_ref, "Failed to delete photo file");
    }
    Ok(Json(DataResponse {
        data: session.into(),
    }))
}

/// POST /api/v1/inspections/{id}/finalize
///
/// Produces the locked report. The store flips the session's lock flag and
/// inserts the report in one step, so a stale copy is rejected.
pub async fn finalize(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<ReportRecord>>)> {
    let mut session = load_for(&state, &user, id).await?;
    let report = finalize_session(&mut session, Utc::now())?;
    let report_id = state.store.save_report(&session, &report).await?;
    let record = ReportRecord {
        id: report_id,
        report,
    };

    tracing::info!(
        session_id = id,
        report_id,
        overall_result = record.report.overall_result().as_str(),
        "Inspection finalized"
    );
    publish_report_event(&state, event_types::REPORT_FINALIZED, &record, user.user_id);
    if record.report.follow_up().is_some() {
        publish_report_event(
            &state,
            event_types::REPORT_FOLLOW_UP_REQUIRED,
            &record,
            user.user_id,
        );
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}
