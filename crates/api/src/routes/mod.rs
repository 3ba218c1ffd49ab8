pub mod area;
pub mod client;
pub mod control;
pub mod health;
pub mod inspection;
pub mod organization;
pub mod report;
pub mod schedule;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /organizations                                    list, create (superadmin)
/// /organizations/{id}                               get, update
///
/// /areas                                            list, create
/// /areas/{id}                                       update, deactivate
/// /areas/{id}/departments                           list, create
/// /areas/{id}/departments/{department_id}           update, deactivate
///
/// /users                                            list (admin)
/// /users/invite                                     invite (POST)
/// /users/{id}                                       get, update
///
/// /clients                                          list, create (admin)
/// /clients/{id}                                     get, update, deactivate
///
/// /controls                                         list, create
/// /controls/{id}                                    get, update, deactivate
/// /controls/{id}/items                              replace items (PUT)
///
/// /inspections                                      start (POST)
/// /inspections/scan                                 start from QR code (POST)
/// /inspections/{id}                                 session view
/// /inspections/{id}/advance                         move cursor (POST)
/// /inspections/{id}/items/{item_id}                 resolve item (PUT)
/// /inspections/{id}/items/{item_id}/photos          upload photo (POST)
/// /inspections/{id}/items/{item_id}/photos/{ref}    detach photo (DELETE)
/// /inspections/{id}/finalize                        finalize (POST)
///
/// /reports                                          list (admin)
/// /reports/{id}                                     get
/// /reports/{id}/follow-up                           update follow-up (PUT)
/// /reports/{id}/follow-up/resolve                   resolve follow-up (POST)
/// /reports/{id}/export                              CSV download
///
/// /schedule                                         due schedule
/// /schedule/summary                                 tier counts
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/organizations", organization::router())
        .nest("/areas", area::router())
        .nest("/users", user::router())
        .nest("/clients", client::router())
        .nest("/controls", control::router())
        .nest("/inspections", inspection::router())
        .nest("/reports", report::router())
        .nest("/schedule", schedule::router())
}
