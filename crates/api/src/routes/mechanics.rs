use axum::routing::get;
use axum::Router;

use crate::handlers::mechanics;
use crate::state::AppState;

/// Mechanic routes mounted at `/mechanics`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create
/// GET    /specialties       -> specialties
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update
/// DELETE /{id}              -> delete
/// GET    /{id}/performance  -> performance
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(mechanics::list).post(mechanics::create))
        .route("/specialties", get(mechanics::specialties))
        .route(
            "/{id}",
            get(mechanics::get_by_id)
                .put(mechanics::update)
                .delete(mechanics::delete),
        )
        .route("/{id}/performance", get(mechanics::performance))
}
