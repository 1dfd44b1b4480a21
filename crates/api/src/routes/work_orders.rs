use axum::routing::{get, put};
use axum::Router;

use crate::handlers::work_orders;
use crate::state::AppState;

/// Work order routes mounted at `/work-orders`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create (planner)
/// GET    /mechanic-alerts  -> mechanic_alerts
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update (planner)
/// DELETE /{id}             -> delete (supervisor)
/// PUT    /{id}/start       -> start
/// PUT    /{id}/complete    -> complete
/// GET    /{id}/parts       -> parts
/// GET    /{id}/alerts      -> alerts
/// GET    /{id}/print       -> print
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(work_orders::list).post(work_orders::create))
        .route("/mechanic-alerts", get(work_orders::mechanic_alerts))
        .route(
            "/{id}",
            get(work_orders::get_by_id)
                .put(work_orders::update)
                .delete(work_orders::delete),
        )
        .route("/{id}/start", put(work_orders::start))
        .route("/{id}/complete", put(work_orders::complete))
        .route("/{id}/parts", get(work_orders::parts))
        .route("/{id}/alerts", get(work_orders::alerts))
        .route("/{id}/print", get(work_orders::print))
}
