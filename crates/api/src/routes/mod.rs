pub mod auth;
pub mod backlog;
pub mod catalogs;
pub mod dashboard;
pub mod equipment;
pub mod health;
pub mod imports;
pub mod inventory;
pub mod mechanics;
pub mod oil_analyses;
pub mod preventive_plans;
pub mod tires;
pub mod users;
pub mod work_orders;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /                                     service index
///
/// /auth/login                           login (public)
/// /auth/validate | /me | /logout        token checks (requires auth)
/// /auth/change-password                 change own password
///
/// /users                                list, create (admin only)
/// /users/profile                        own profile
/// /users/access-levels                  access level catalog
/// /users/{id}                           get, update, delete (admin only)
///
/// /dashboard                            indicators and recent activity
///
/// /equipment-types[/{id}]               catalog CRUD
/// /maintenance-types[/{id}]             catalog CRUD
/// /item-groups[/{id}]                   catalog CRUD
/// /items[/{id}]                         catalog CRUD
///
/// /equipment[/{id}]                     fleet CRUD
/// /mechanics[/{id}]                     mechanic CRUD, specialties, performance
///
/// /work-orders[/{id}]                   work order CRUD
/// /work-orders/{id}/start|complete      lifecycle transitions
/// /work-orders/{id}/parts|alerts|print  consumption, alerts, printable sheet
/// /work-orders/mechanic-alerts          alerts for a mechanic's open orders
///
/// /inventory/parts[/{id}]               parts CRUD and quick movements
/// /inventory/movements                  movement history and posting
/// /inventory/count | /count-report      physical counts
/// /inventory/locations                  stock locations
///
/// /imports/parts                        CSV/XLSX parts import (multipart)
///
/// /tires[/{id}]                         tire CRUD and lifecycle
/// /oil-analyses[/{id}]                  oil sample tracking
/// /preventive-plans[/{id}]              preventive scheduling
/// /backlog[/{id}]                       GUT-prioritised backlog
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::index))
        // Authentication and account management.
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/dashboard", dashboard::router())
        // Reference catalogs.
        .nest("/equipment-types", catalogs::equipment_types_router())
        .nest("/maintenance-types", catalogs::maintenance_types_router())
        .nest("/item-groups", catalogs::item_groups_router())
        .nest("/items", catalogs::items_router())
        // Fleet and workforce.
        .nest("/equipment", equipment::router())
        .nest("/mechanics", mechanics::router())
        // Maintenance execution.
        .nest("/work-orders", work_orders::router())
        .nest("/inventory", inventory::router())
        .nest("/imports", imports::router())
        .nest("/tires", tires::router())
        .nest("/oil-analyses", oil_analyses::router())
        .nest("/preventive-plans", preventive_plans::router())
        .nest("/backlog", backlog::router())
}
