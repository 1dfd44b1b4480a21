use axum::routing::{get, post};
use axum::Router;

use crate::handlers::preventive_plans;
use crate::state::AppState;

/// Preventive plan routes mounted at `/preventive-plans`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create (supervisor)
/// POST   /generate-pending  -> generate_pending (planner)
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update (supervisor)
/// DELETE /{id}              -> delete (supervisor)
/// POST   /{id}/execute      -> execute (planner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(preventive_plans::list).post(preventive_plans::create),
        )
        .route(
            "/generate-pending",
            post(preventive_plans::generate_pending),
        )
        .route(
            "/{id}",
            get(preventive_plans::get_by_id)
                .put(preventive_plans::update)
                .delete(preventive_plans::delete),
        )
        .route("/{id}/execute", post(preventive_plans::execute))
}
