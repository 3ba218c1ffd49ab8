use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::inspection;
use crate::state::AppState;

/// Routes mounted at `/inspections`.
///
/// ```text
/// POST   /                                          -> start
/// POST   /scan                                      -> scan
/// GET    /{id}                                      -> get_by_id
/// POST   /{id}/advance                              -> advance
/// PUT    /{id}/items/{item_id}                      -> update_item
/// POST   /{id}/items/{item_id}/photos               -> upload_photo
/// DELETE /{id}/items/{item_id}/photos/{photo_ref}   -> delete_photo
/// POST   /{id}/finalize                             -> finalize
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(inspection::start))
        .route("/scan", post(inspection::scan))
        .route("/{id}", get(inspection::get_by_id))
        .route("/{id}/advance", post(inspection::advance))
        .route("/{id}/items/{item_id}", put(inspection::update_item))
        .route(
            "/{id}/items/{item_id}/photos",
            post(inspection::upload_photo),
        )
        .route(
            "/{id}/items/{item_id}/photos/{photo_ref}",
            delete(inspection::delete_photo),
        )
        .route("/{id}/finalize", post(inspection::finalize))
}
