//! Handlers for the `/inventory` resource: parts, stock movements, physical
//! counts and the stock reports.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cmms_core::inventory::{
    MovementType, DEFAULT_MAX_STOCK, DEFAULT_MIN_STOCK, NO_LOCATION_LABEL, STOCK_STATUS_LOW,
};
use cmms_core::numeric::round2;
use cmms_core::types::DbId;
use cmms_core::validation::{
    optional_text, parse_date, require, require_text, validate_non_negative,
};
use cmms_db::models::part::{CategoryCount, CreatePart, PartFilter, PartResponse, UpdatePart};
use cmms_db::models::stock_movement::{CreateStockMovement, MovementFilter};
use cmms_db::repositories::{PartRepo, StockMovementRepo};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireStorekeeper, RequireSupervisor};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePartRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<i32>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub unit_price: Option<f64>,
    pub location: Option<String>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub item_group_id: Option<DbId>,
    pub stock_location_id: Option<DbId>,
    pub registered_on: Option<String>,
    pub last_valuation_price: Option<f64>,
    pub last_purchase_price: Option<f64>,
}

/// Body of `POST /parts/{id}/movement`.
#[derive(Debug, Deserialize)]
pub struct PartMovementRequest {
    pub movement_type: Option<String>,
    pub quantity: Option<i32>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMovementRequest {
    pub part_id: Option<DbId>,
    pub movement_type: Option<String>,
    pub quantity: Option<i32>,
    pub reason: Option<String>,
    pub invoice_number: Option<String>,
    pub equipment_id: Option<DbId>,
    pub mechanic_id: Option<DbId>,
    pub sector: Option<String>,
    pub work_order_id: Option<DbId>,
    pub source_location_id: Option<DbId>,
    pub target_location_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct CountRequest {
    pub part_id: Option<DbId>,
    pub counted_quantity: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkCount {
    pub counted_parts: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountReportQuery {
    pub item_group_id: Option<DbId>,
    pub stock_location_id: Option<DbId>,
    pub low_stock_only: Option<bool>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct StockStats {
    pub total_parts: usize,
    pub low_stock_count: usize,
    pub total_value: f64,
}

#[derive(Debug, Serialize)]
pub struct StockReport {
    #[serde(flatten)]
    pub stats: StockStats,
    pub categories: Vec<CategoryCount>,
    pub low_stock_parts: Vec<PartResponse>,
}

#[derive(Debug, Serialize)]
pub struct CountReport {
    #[serde(flatten)]
    pub stats: StockStats,
    pub never_counted: usize,
    pub locations: IndexMap<String, Vec<PartResponse>>,
}

fn is_low(part: &PartResponse) -> bool {
    part.stock_status == STOCK_STATUS_LOW
}

fn stock_stats(parts: &[PartResponse]) -> StockStats {
    StockStats {
        total_parts: parts.len(),
        low_stock_count: parts.iter().filter(|p| is_low(p)).count(),
        total_value: round2(parts.iter().map(|p| p.stock_value).sum()),
    }
}

/// Group parts by stock-location name, keeping the incoming order.
fn group_by_location(parts: Vec<PartResponse>) -> IndexMap<String, Vec<PartResponse>> {
    let mut groups: IndexMap<String, Vec<PartResponse>> = IndexMap::new();
    for part in parts {
        let key = part
            .part
            .stock_location_name
            .clone()
            .unwrap_or_else(|| NO_LOCATION_LABEL.to_string());
        groups.entry(key).or_default().push(part);
    }
    groups
}

async fn list_parts(state: &AppState, filter: &PartFilter) -> AppResult<Vec<PartResponse>> {
    let parts = PartRepo::list(&state.pool, filter).await?;
    Ok(parts.into_iter().map(PartResponse::from).collect())
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

/// GET /api/v1/inventory/parts
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<PartFilter>,
) -> AppResult<impl IntoResponse> {
    let data = list_parts(&state, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/inventory/parts
pub async fn create(
    State(state): State<AppState>,
    RequireStorekeeper(user): RequireStorekeeper,
    Json(input): Json<CreatePartRequest>,
) -> AppResult<impl IntoResponse> {
    let code = require_text("code", input.code.as_deref())?;
    let name = require_text("name", input.name.as_deref())?;
    let unit = require_text("unit", input.unit.as_deref())?;
    let quantity = input.quantity.unwrap_or(0);
    let min_stock = input.min_stock.unwrap_or(DEFAULT_MIN_STOCK);
    let max_stock = input.max_stock.unwrap_or(DEFAULT_MAX_STOCK);
    let unit_price = input.unit_price.unwrap_or(0.0);
    validate_non_negative("quantity", f64::from(quantity))?;
    validate_non_negative("min_stock", f64::from(min_stock))?;
    validate_non_negative("max_stock", f64::from(max_stock))?;
    validate_non_negative("unit_price", unit_price)?;
    let registered_on = match optional_text(input.registered_on.as_deref()) {
        Some(raw) => Some(parse_date("registered_on", &raw)?),
        None => None,
    };

    let part = PartRepo::create(
        &state.pool,
        &CreatePart {
            code,
            name,
            category: optional_text(input.category.as_deref()),
            description: optional_text(input.description.as_deref()),
            unit,
            quantity,
            min_stock,
            max_stock,
            unit_price,
            location: optional_text(input.location.as_deref()),
            supplier: optional_text(input.supplier.as_deref()),
            notes: optional_text(input.notes.as_deref()),
            item_group_id: input.item_group_id,
            stock_location_id: input.stock_location_id,
            registered_on,
            last_valuation_price: input.last_valuation_price,
            last_purchase_price: input.last_purchase_price,
        },
    )
    .await?;

    tracing::info!(part_id = part.id, code = %part.code, user_id = user.user_id, "Part created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PartResponse::from(part),
        }),
    ))
}

/// GET /api/v1/inventory/parts/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let part = PartRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Part", id))?;
    Ok(Json(DataResponse {
        data: PartResponse::from(part),
    }))
}

/// PUT /api/v1/inventory/parts/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireStorekeeper(_user): RequireStorekeeper,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePart>,
) -> AppResult<impl IntoResponse> {
    for (field, value) in [("min_stock", input.min_stock), ("max_stock", input.max_stock)] {
        if let Some(v) = value {
            validate_non_negative(field, f64::from(v))?;
        }
    }
    if let Some(price) = input.unit_price {
        validate_non_negative("unit_price", price)?;
    }
    let part = PartRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Part", id))?;
    Ok(Json(DataResponse {
        data: PartResponse::from(part),
    }))
}

/// DELETE /api/v1/inventory/parts/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let used = PartRepo::work_order_usage_count(&state.pool, id).await?;
    if used > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete part: used by {used} work orders"
        )));
    }
    if !PartRepo::delete(&state.pool, id).await? {
        return Err(not_found("Part", id));
    }
    tracing::info!(part_id = id, user_id = user.user_id, "Part deleted");
    Ok(Json(MessageResponse::new("Part deleted")))
}

/// POST /api/v1/inventory/parts/{id}/movement
pub async fn part_movement(
    State(state): State<AppState>,
    RequireStorekeeper(user): RequireStorekeeper,
    Path(id): Path<DbId>,
    Json(input): Json<PartMovementRequest>,
) -> AppResult<impl IntoResponse> {
    let movement = MovementType::from_user_input(
        &require_text("movement_type", input.movement_type.as_deref())?,
        false,
    )?;
    let quantity = require("quantity", input.quantity)?;

    let recorded = StockMovementRepo::record(
        &state.pool,
        movement,
        &CreateStockMovement {
            part_id: id,
            movement_type: movement.as_str().to_string(),
            quantity,
            reason: optional_text(input.reason.as_deref()),
            ..Default::default()
        },
        user.user_id,
    )
    .await?
    .ok_or_else(|| not_found("Part", id))?;

    tracing::info!(
        part_id = id,
        movement_type = movement.as_str(),
        quantity,
        user_id = user.user_id,
        "Stock movement recorded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: recorded })))
}

/// GET /api/v1/inventory/categories
pub async fn categories(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let data = PartRepo::categories(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/inventory/report
pub async fn report(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let parts = list_parts(&state, &PartFilter::default()).await?;
    let stats = stock_stats(&parts);
    let categories = PartRepo::category_counts(&state.pool).await?;
    let low_stock_parts = parts.into_iter().filter(is_low).collect();
    Ok(Json(DataResponse {
        data: StockReport {
            stats,
            categories,
            low_stock_parts,
        },
    }))
}

// ---------------------------------------------------------------------------
// Movements
// ---------------------------------------------------------------------------

/// GET /api/v1/inventory/movements
pub async fn list_movements(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<MovementFilter>,
) -> AppResult<impl IntoResponse> {
    let data = StockMovementRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/inventory/movements
pub async fn create_movement(
    State(state): State<AppState>,
    RequireStorekeeper(user): RequireStorekeeper,
    Json(input): Json<CreateMovementRequest>,
) -> AppResult<impl IntoResponse> {
    let part_id = require("part_id", input.part_id)?;
    let movement = MovementType::from_user_input(
        &require_text("movement_type", input.movement_type.as_deref())?,
        true,
    )?;
    let quantity = require("quantity", input.quantity)?;

    let recorded = StockMovementRepo::record(
        &state.pool,
        movement,
        &CreateStockMovement {
            part_id,
            movement_type: movement.as_str().to_string(),
            quantity,
            reason: optional_text(input.reason.as_deref()),
            invoice_number: optional_text(input.invoice_number.as_deref()),
            equipment_id: input.equipment_id,
            mechanic_id: input.mechanic_id,
            sector: optional_text(input.sector.as_deref()),
            work_order_id: input.work_order_id,
            source_location_id: input.source_location_id,
            target_location_id: input.target_location_id,
        },
        user.user_id,
    )
    .await?
    .ok_or_else(|| not_found("Part", part_id))?;

    tracing::info!(
        part_id,
        movement_type = movement.as_str(),
        quantity,
        user_id = user.user_id,
        "Stock movement recorded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: recorded })))
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// POST /api/v1/inventory/count
///
/// With a `part_id` the part is counted and adjusted; without one every
/// part is stamped as counted.
pub async fn count(
    State(state): State<AppState>,
    RequireStorekeeper(user): RequireStorekeeper,
    Json(input): Json<CountRequest>,
) -> AppResult<Response> {
    let Some(part_id) = input.part_id else {
        let counted_parts = PartRepo::mark_all_counted(&state.pool, user.user_id).await?;
        tracing::info!(counted_parts, user_id = user.user_id, "Full inventory count recorded");
        return Ok(Json(DataResponse {
            data: BulkCount { counted_parts },
        })
        .into_response());
    };

    let counted = require("counted_quantity", input.counted_quantity)?;
    let result = PartRepo::count_one(
        &state.pool,
        part_id,
        counted,
        input.notes.as_deref(),
        user.user_id,
    )
    .await?
    .ok_or_else(|| not_found("Part", part_id))?;

    tracing::info!(
        part_id,
        difference = result.difference,
        user_id = user.user_id,
        "Inventory count recorded",
    );
    Ok(Json(DataResponse { data: result }).into_response())
}

/// GET /api/v1/inventory/count-report
pub async fn count_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<CountReportQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = PartFilter {
        item_group_id: query.item_group_id,
        stock_location_id: query.stock_location_id,
        low_stock: query.low_stock_only,
        ..Default::default()
    };
    let parts = list_parts(&state, &filter).await?;
    let stats = stock_stats(&parts);
    let never_counted = parts
        .iter()
        .filter(|p| p.part.last_counted_at.is_none())
        .count();
    Ok(Json(DataResponse {
        data: CountReport {
            stats,
            never_counted,
            locations: group_by_location(parts),
        },
    }))
}
