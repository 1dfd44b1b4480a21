use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{catalogs, inventory};
use crate::state::AppState;

/// Inventory routes mounted at `/inventory`.
///
/// ```text
/// GET    /parts                -> list
/// POST   /parts                -> create (storekeeper)
/// GET    /parts/{id}           -> get_by_id
/// PUT    /parts/{id}           -> update (storekeeper)
/// DELETE /parts/{id}           -> delete (supervisor)
/// POST   /parts/{id}/movement  -> part_movement (storekeeper)
/// GET    /movements            -> list_movements
/// POST   /movements            -> create_movement (storekeeper)
/// POST   /count                -> count (storekeeper)
/// GET    /count-report         -> count_report
/// GET    /categories           -> categories
/// GET    /report               -> report
/// GET    /locations            -> list_stock_locations
/// POST   /locations            -> create_stock_location (supervisor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/parts", get(inventory::list).post(inventory::create))
        .route(
            "/parts/{id}",
            get(inventory::get_by_id)
                .put(inventory::update)
                .delete(inventory::delete),
        )
        .route("/parts/{id}/movement", post(inventory::part_movement))
        .route(
            "/movements",
            get(inventory::list_movements).post(inventory::create_movement),
        )
        .route("/count", post(inventory::count))
        .route("/count-report", get(inventory::count_report))
        .route("/categories", get(inventory::categories))
        .route("/report", get(inventory::report))
        .route(
            "/locations",
            get(catalogs::list_stock_locations).post(catalogs::create_stock_location),
        )
}
