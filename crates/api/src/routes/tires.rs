use axum::routing::{get, put};
use axum::Router;

use crate::handlers::tires;
use crate::state::AppState;

/// Tire routes mounted at `/tires`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /report                    -> report
/// GET    /performance-report        -> performance_report
/// GET    /alerts                    -> alerts
/// GET    /equipment/{equipment_id}  -> by_equipment
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete
/// PUT    /{id}/install              -> install
/// PUT    /{id}/remove               -> remove
/// PUT    /{id}/mileage              -> update_mileage
/// PUT    /{id}/treatment            -> treatment
/// PUT    /{id}/retread-return       -> retread_return
/// PUT    /{id}/tread                -> measure_tread
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tires::list).post(tires::create))
        .route("/report", get(tires::report))
        .route("/performance-report", get(tires::performance_report))
        .route("/alerts", get(tires::alerts))
        .route("/equipment/{equipment_id}", get(tires::by_equipment))
        .route(
            "/{id}",
            get(tires::get_by_id)
                .put(tires::update)
                .delete(tires::delete),
        )
        .route("/{id}/install", put(tires::install))
        .route("/{id}/remove", put(tires::remove))
        .route("/{id}/mileage", put(tires::update_mileage))
        .route("/{id}/treatment", put(tires::treatment))
        .route("/{id}/retread-return", put(tires::retread_return))
        .route("/{id}/tread", put(tires::measure_tread))
}
