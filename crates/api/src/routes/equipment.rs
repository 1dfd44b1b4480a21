use axum::routing::get;
use axum::Router;

use crate::handlers::equipment;
use crate::state::AppState;

/// Equipment routes mounted at `/equipment`.
///
/// ```text
/// GET    /      -> list
/// POST   /      -> create (supervisor)
/// GET    /{id}  -> get_by_id
/// PUT    /{id}  -> update (supervisor)
/// DELETE /{id}  -> delete (supervisor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(equipment::list).post(equipment::create))
        .route(
            "/{id}",
            get(equipment::get_by_id)
                .put(equipment::update)
                .delete(equipment::delete),
        )
}
