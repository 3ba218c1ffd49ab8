use axum::routing::{get, post};
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /         -> list
/// POST   /invite   -> invite
/// GET    /{id}     -> get_by_id
/// PUT    /{id}     -> update
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(user::list))
        .route("/invite", post(user::invite))
        .route("/{id}", get(user::get_by_id).put(user::update))
}
