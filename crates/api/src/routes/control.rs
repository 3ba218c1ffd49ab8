use axum::routing::{get, put};
use axum::Router;

use crate::handlers::control;
use crate::state::AppState;

/// Routes mounted at `/controls`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update
/// DELETE /{id}          -> deactivate
/// PUT    /{id}/items    -> replace_items
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(control::list).post(control::create))
        .route(
            "/{id}",
            get(control::get_by_id)
                .put(control::update)
                .delete(control::deactivate),
        )
        .route("/{id}/items", put(control::replace_items))
}
