use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kontrol_core::error::{CoreError, ErrorKind, InspectionError};
use kontrol_core::export::ExportError;
use kontrol_core::photos::PhotoError;
use kontrol_core::store::StoreError;
use serde_json::{json, Map, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain and persistence errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses of
/// the form `{"error": ..., "code": ...}` plus structured extras.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure of the inspection workflow.
    #[error(transparent)]
    Inspection(#[from] InspectionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Request body failed `validator` checks.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, machine-readable code, message and optional extra fields.
type ErrorParts = (StatusCode, &'static str, String, Map<String, Value>);

fn parts(status: StatusCode, code: &'static str, message: String) -> ErrorParts {
    (status, code, message, Map::new())
}

fn internal(error: &dyn std::fmt::Display, context: &str) -> ErrorParts {
    tracing::error!(error = %error, "{}", context);
    parts(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, extra) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Inspection(err) => classify_inspection_error(err),
            AppError::Store(err) => classify_store_error(err),
            AppError::Photo(err) => classify_photo_error(err),
            AppError::Export(ExportError::Inspection(err)) => classify_inspection_error(err),
            AppError::Export(err @ ExportError::Render(_)) => internal(err, "Report export failed"),
            AppError::Validation(errors) => parts(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errors.to_string(),
            ),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => parts(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg, "Internal error"),
        };

        let mut body = Map::new();
        body.insert("error".into(), Value::String(message));
        body.insert("code".into(), Value::String(code.to_string()));
        body.extend(extra);

        (status, axum::Json(Value::Object(body))).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound { entity, id } => parts(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => {
            parts(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        CoreError::Conflict(msg) => parts(StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => {
            parts(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
        }
        CoreError::Forbidden(msg) => parts(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => internal(msg, "Internal core error"),
    }
}

/// Map the workflow taxonomy: validation failures are 422 (unknown items
/// 404), invalid-state failures 409, bounds failures 422.
fn classify_inspection_error(err: &InspectionError) -> ErrorParts {
    let message = err.to_string();
    match err {
        InspectionError::Incomplete { unresolved } => {
            let mut extra = Map::new();
            extra.insert("unresolved_item_ids".into(), json!(unresolved));
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                message,
                extra,
            )
        }
        InspectionError::UnknownItem(_) => parts(StatusCode::NOT_FOUND, "NOT_FOUND", message),
        InspectionError::PhotoLimitReached { item_id, max } => {
            let mut extra = Map::new();
            extra.insert("item_id".into(), json!(item_id));
            extra.insert("max_photos".into(), json!(max));
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BOUNDS_ERROR",
                message,
                extra,
            )
        }
        other => match other.kind() {
            ErrorKind::InvalidState => parts(StatusCode::CONFLICT, "INVALID_STATE", message),
            ErrorKind::Bounds => parts(StatusCode::UNPROCESSABLE_ENTITY, "BOUNDS_ERROR", message),
            ErrorKind::Validation => {
                parts(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
            }
        },
    }
}

fn classify_store_error(err: &StoreError) -> ErrorParts {
    match err {
        StoreError::NotFound { .. } => parts(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        StoreError::VersionConflict { .. } => {
            parts(StatusCode::CONFLICT, "CONFLICT", err.to_string())
        }
        StoreError::SessionLocked { .. } | StoreError::FollowUpResolved { .. } => {
            parts(StatusCode::CONFLICT, "INVALID_STATE", err.to_string())
        }
        StoreError::InvalidPersistedValue(_) | StoreError::Backend(_) => {
            internal(err, "Inspection store error")
        }
    }
}

fn classify_photo_error(err: &PhotoError) -> ErrorParts {
    match err {
        PhotoError::UnsupportedType(_) => parts(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            err.to_string(),
        ),
        PhotoError::TooLarge { .. } => {
            parts(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", err.to_string())
        }
        PhotoError::Empty | PhotoError::InvalidReference(_) => {
            parts(StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
        }
        PhotoError::Io(_) => internal(err, "Photo storage error"),
    }
}

/// Classify a sqlx error.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorParts {
    match err {
        sqlx::Error::RowNotFound => parts(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return parts(
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            internal(db_err, "Database error")
        }
        other => internal(other, "Database error"),
    }
}
