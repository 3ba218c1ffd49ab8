use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::report;
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// GET    /                          -> list
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}/follow-up            -> update_follow_up
/// POST   /{id}/follow-up/resolve    -> resolve_follow_up
/// GET    /{id}/export               -> export
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(report::list))
        .route("/{id}", get(report::get_by_id))
        .route("/{id}/follow-up", put(report::update_follow_up))
        .route("/{id}/follow-up/resolve", post(report::resolve_follow_up))
        .route("/{id}/export", get(report::export))
}
