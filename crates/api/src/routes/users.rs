use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// User management routes mounted at `/users`.
///
/// ```text
/// GET    /               -> list (admin)
/// POST   /               -> create (admin)
/// GET    /profile        -> profile
/// PUT    /profile        -> update_profile
/// GET    /access-levels  -> access_levels
/// GET    /{id}           -> get_by_id (admin)
/// PUT    /{id}           -> update (admin)
/// DELETE /{id}           -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list).post(users::create))
        .route("/profile", get(users::profile).put(users::update_profile))
        .route("/access-levels", get(users::access_levels))
        .route(
            "/{id}",
            get(users::get_by_id)
                .put(users::update)
                .delete(users::delete),
        )
}
