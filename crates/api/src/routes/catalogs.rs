//! Route definitions for the reference catalogs.
//!
//! Each catalog gets its own router so `routes/mod.rs` can mount them at
//! their top-level paths.

use axum::routing::get;
use axum::Router;

use crate::handlers::catalogs;
use crate::state::AppState;

/// Equipment type routes mounted at `/equipment-types`.
///
/// ```text
/// GET    /      -> list_equipment_types
/// POST   /      -> create_equipment_type
/// GET    /{id}  -> get_equipment_type
/// PUT    /{id}  -> update_equipment_type
/// DELETE /{id}  -> delete_equipment_type
/// ```
pub fn equipment_types_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(catalogs::list_equipment_types).post(catalogs::create_equipment_type),
        )
        .route(
            "/{id}",
            get(catalogs::get_equipment_type)
                .put(catalogs::update_equipment_type)
                .delete(catalogs::delete_equipment_type),
        )
}

/// Maintenance type routes mounted at `/maintenance-types`.
pub fn maintenance_types_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(catalogs::list_maintenance_types).post(catalogs::create_maintenance_type),
        )
        .route(
            "/{id}",
            get(catalogs::get_maintenance_type)
                .put(catalogs::update_maintenance_type)
                .delete(catalogs::delete_maintenance_type),
        )
}

/// Item group routes mounted at `/item-groups`.
pub fn item_groups_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(catalogs::list_item_groups).post(catalogs::create_item_group),
        )
        .route(
            "/{id}",
            get(catalogs::get_item_group)
                .put(catalogs::update_item_group)
                .delete(catalogs::delete_item_group),
        )
}

/// Item routes mounted at `/items`.
pub fn items_router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalogs::list_items).post(catalogs::create_item))
        .route(
            "/{id}",
            get(catalogs::get_item)
                .put(catalogs::update_item)
                .delete(catalogs::delete_item),
        )
}
