use axum::routing::get;
use axum::Router;

use crate::handlers::schedule;
use crate::state::AppState;

/// Routes mounted at `/schedule`.
///
/// ```text
/// GET    /           -> list
/// GET    /summary    -> summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(schedule::list))
        .route("/summary", get(schedule::summary))
}
