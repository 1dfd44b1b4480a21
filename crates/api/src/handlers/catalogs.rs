//! Handlers for the reference catalogs: equipment types, maintenance types,
//! item groups, catalog items and stock locations.
//!
//! Reads are open to any authenticated user. Deletes are refused while other
//! records still reference the entry.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::types::DbId;
use cmms_core::validation::{optional_text, require_text, validate_hex_color};
use cmms_db::models::catalog::{
    CatalogFilter, CreateEquipmentType, CreateItem, CreateItemGroup, CreateMaintenanceType,
    CreateStockLocation, UpdateEquipmentType, UpdateItem, UpdateItemGroup, UpdateMaintenanceType,
};
use cmms_db::repositories::{
    EquipmentTypeRepo, ItemGroupRepo, ItemRepo, MaintenanceTypeRepo, StockLocationRepo,
};
use serde::Deserialize;

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireStorekeeper, RequireSupervisor};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// Default maintenance-type colour when none is given.
const DEFAULT_COLOR: &str = "#6c757d";

fn default_true() -> bool {
    true
}

fn still_in_use(what: &str, count: i64, by: &str) -> AppError {
    AppError::BadRequest(format!(
        "Cannot delete {what}: it is used by {count} {by}"
    ))
}

// ---------------------------------------------------------------------------
// Equipment types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateEquipmentTypeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// GET /api/v1/equipment-types
pub async fn list_equipment_types(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<CatalogFilter>,
) -> AppResult<impl IntoResponse> {
    let data = EquipmentTypeRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/equipment-types
pub async fn create_equipment_type(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Json(input): Json<CreateEquipmentTypeRequest>,
) -> AppResult<impl IntoResponse> {
    let created = EquipmentTypeRepo::create(
        &state.pool,
        &CreateEquipmentType {
            name: require_text("name", input.name.as_deref())?,
            description: optional_text(input.description.as_deref()),
            is_active: input.is_active,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/equipment-types/{id}
pub async fn get_equipment_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = EquipmentTypeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("EquipmentType", id))?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/equipment-types/{id}
pub async fn update_equipment_type(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEquipmentType>,
) -> AppResult<impl IntoResponse> {
    let data = EquipmentTypeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("EquipmentType", id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/equipment-types/{id}
pub async fn delete_equipment_type(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let in_use = EquipmentTypeRepo::usage_count(&state.pool, id).await?;
    if in_use > 0 {
        return Err(still_in_use("equipment type", in_use, "equipment"));
    }
    if !EquipmentTypeRepo::delete(&state.pool, id).await? {
        return Err(not_found("EquipmentType", id));
    }
    Ok(Json(MessageResponse::new("Equipment type deleted")))
}

// ---------------------------------------------------------------------------
// Maintenance types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateMaintenanceTypeRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// GET /api/v1/maintenance-types
pub async fn list_maintenance_types(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<CatalogFilter>,
) -> AppResult<impl IntoResponse> {
    let data = MaintenanceTypeRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/maintenance-types
pub async fn create_maintenance_type(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Json(input): Json<CreateMaintenanceTypeRequest>,
) -> AppResult<impl IntoResponse> {
    let color = optional_text(input.color.as_deref()).unwrap_or_else(|| DEFAULT_COLOR.into());
    validate_hex_color(&color)?;
    let created = MaintenanceTypeRepo::create(
        &state.pool,
        &CreateMaintenanceType {
            name: require_text("name", input.name.as_deref())?,
            code: require_text("code", input.code.as_deref())?.to_uppercase(),
            description: optional_text(input.description.as_deref()),
            color,
            is_active: input.is_active,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/maintenance-types/{id}
pub async fn get_maintenance_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = MaintenanceTypeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("MaintenanceType", id))?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/maintenance-types/{id}
pub async fn update_maintenance_type(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateMaintenanceType>,
) -> AppResult<impl IntoResponse> {
    if let Some(color) = input.color.as_deref() {
        validate_hex_color(color)?;
    }
    input.code = input.code.map(|c| c.trim().to_uppercase());
    let data = MaintenanceTypeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("MaintenanceType", id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/maintenance-types/{id}
pub async fn delete_maintenance_type(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let in_use = MaintenanceTypeRepo::usage_count(&state.pool, id).await?;
    if in_use > 0 {
        return Err(still_in_use("maintenance type", in_use, "work orders"));
    }
    if !MaintenanceTypeRepo::delete(&state.pool, id).await? {
        return Err(not_found("MaintenanceType", id));
    }
    Ok(Json(MessageResponse::new("Maintenance type deleted")))
}

// ---------------------------------------------------------------------------
// Item groups
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemGroupRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// GET /api/v1/item-groups
pub async fn list_item_groups(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<CatalogFilter>,
) -> AppResult<impl IntoResponse> {
    let data = ItemGroupRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/item-groups
pub async fn create_item_group(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Json(input): Json<CreateItemGroupRequest>,
) -> AppResult<impl IntoResponse> {
    let created = ItemGroupRepo::create(
        &state.pool,
        &CreateItemGroup {
            name: require_text("name", input.name.as_deref())?,
            code: require_text("code", input.code.as_deref())?.to_uppercase(),
            description: optional_text(input.description.as_deref()),
            is_active: input.is_active,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/item-groups/{id}
pub async fn get_item_group(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = ItemGroupRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("ItemGroup", id))?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/item-groups/{id}
pub async fn update_item_group(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateItemGroup>,
) -> AppResult<impl IntoResponse> {
    input.code = input.code.map(|c| c.trim().to_uppercase());
    let data = ItemGroupRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("ItemGroup", id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/item-groups/{id}
pub async fn delete_item_group(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let in_use = ItemGroupRepo::usage_count(&state.pool, id).await?;
    if in_use > 0 {
        return Err(still_in_use("item group", in_use, "parts"));
    }
    if !ItemGroupRepo::delete(&state.pool, id).await? {
        return Err(not_found("ItemGroup", id));
    }
    Ok(Json(MessageResponse::new("Item group deleted")))
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub group_name: Option<String>,
    pub manufacturer: Option<String>,
}

/// GET /api/v1/items
pub async fn list_items(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<CatalogFilter>,
) -> AppResult<impl IntoResponse> {
    let data = ItemRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/items
pub async fn create_item(
    State(state): State<AppState>,
    RequireStorekeeper(_user): RequireStorekeeper,
    Json(input): Json<CreateItemRequest>,
) -> AppResult<impl IntoResponse> {
    let created = ItemRepo::create(
        &state.pool,
        &CreateItem {
            code: require_text("code", input.code.as_deref())?,
            name: require_text("name", input.name.as_deref())?,
            description: optional_text(input.description.as_deref()),
            unit_of_measure: optional_text(input.unit_of_measure.as_deref())
                .unwrap_or_else(|| "UN".into()),
            group_name: optional_text(input.group_name.as_deref()),
            manufacturer: optional_text(input.manufacturer.as_deref()),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = ItemRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Item", id))?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    RequireStorekeeper(_user): RequireStorekeeper,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateItem>,
) -> AppResult<impl IntoResponse> {
    let data = ItemRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Item", id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    RequireStorekeeper(_user): RequireStorekeeper,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !ItemRepo::delete(&state.pool, id).await? {
        return Err(not_found("Item", id));
    }
    Ok(Json(MessageResponse::new("Item deleted")))
}

// ---------------------------------------------------------------------------
// Stock locations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateStockLocationRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub shelf: Option<String>,
    pub shelf_column: Option<String>,
    pub sector: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/v1/inventory/locations
pub async fn list_stock_locations(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let data = StockLocationRepo::list_active(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/inventory/locations
pub async fn create_stock_location(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Json(input): Json<CreateStockLocationRequest>,
) -> AppResult<impl IntoResponse> {
    let created = StockLocationRepo::create(
        &state.pool,
        &CreateStockLocation {
            name: require_text("name", input.name.as_deref())?,
            code: require_text("code", input.code.as_deref())?.to_uppercase(),
            location: optional_text(input.location.as_deref()),
            shelf: optional_text(input.shelf.as_deref()),
            shelf_column: optional_text(input.shelf_column.as_deref()),
            sector: optional_text(input.sector.as_deref()),
            responsible: optional_text(input.responsible.as_deref()),
            notes: optional_text(input.notes.as_deref()),
        },
    )
    .await?;
    tracing::info!(stock_location_id = created.id, user_id = user.user_id, "Stock location created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}
