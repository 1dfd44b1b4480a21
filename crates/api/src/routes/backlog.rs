use axum::routing::{get, post};
use axum::Router;

use crate::handlers::backlog;
use crate::state::AppState;

/// Backlog routes mounted at `/backlog`.
///
/// ```text
/// GET    /                -> list
/// POST   /                -> create
/// GET    /stats           -> stats
/// POST   /prioritize      -> prioritize (supervisor)
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete (supervisor)
/// POST   /{id}/start      -> start
/// POST   /{id}/complete   -> complete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(backlog::list).post(backlog::create))
        .route("/stats", get(backlog::stats))
        .route("/prioritize", post(backlog::prioritize))
        .route(
            "/{id}",
            get(backlog::get_by_id)
                .put(backlog::update)
                .delete(backlog::delete),
        )
        .route("/{id}/start", post(backlog::start))
        .route("/{id}/complete", post(backlog::complete))
}
