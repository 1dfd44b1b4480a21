use axum::routing::{get, put};
use axum::Router;

use crate::handlers::oil_analyses;
use crate::state::AppState;

/// Oil analysis routes mounted at `/oil-analyses`.
///
/// ```text
/// GET    /               -> list
/// POST   /               -> create (planner)
/// GET    /report         -> report
/// GET    /{id}           -> get_by_id
/// PUT    /{id}           -> update (planner)
/// DELETE /{id}           -> delete (planner)
/// PUT    /{id}/complete  -> complete (planner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(oil_analyses::list).post(oil_analyses::create))
        .route("/report", get(oil_analyses::report))
        .route(
            "/{id}",
            get(oil_analyses::get_by_id)
                .put(oil_analyses::update)
                .delete(oil_analyses::delete),
        )
        .route("/{id}/complete", put(oil_analyses::complete))
}
