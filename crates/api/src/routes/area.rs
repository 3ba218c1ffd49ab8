use axum::routing::{get, put};
use axum::Router;

use crate::handlers::area;
use crate::state::AppState;

/// Routes mounted at `/areas`, with departments nested per area.
///
/// ```text
/// GET    /                                     -> list
/// POST   /                                     -> create
/// PUT    /{id}                                 -> update
/// DELETE /{id}                                 -> deactivate
///
/// GET    /{id}/departments                     -> list_departments
/// POST   /{id}/departments                     -> create_department
/// PUT    /{id}/departments/{department_id}     -> update_department
/// DELETE /{id}/departments/{department_id}     -> deactivate_department
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(area::list).post(area::create))
        .route("/{id}", put(area::update).delete(area::deactivate))
        .route(
            "/{id}/departments",
            get(area::list_departments).post(area::create_department),
        )
        .route(
            "/{id}/departments/{department_id}",
            put(area::update_department).delete(area::deactivate_department),
        )
}
