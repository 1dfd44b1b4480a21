//! Handlers for the `/equipment` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::equipment::{validate_status, STATUS_ACTIVE};
use cmms_core::types::DbId;
use cmms_core::validation::{
    optional_text, parse_date, require, require_text, validate_non_negative,
};
use cmms_db::models::equipment::{CreateEquipment, EquipmentFilter, UpdateEquipment};
use cmms_db::repositories::{EquipmentRepo, EquipmentTypeRepo};
use serde::Deserialize;

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEquipmentRequest {
    pub internal_code: Option<String>,
    pub name: Option<String>,
    pub equipment_type_id: Option<DbId>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub acquired_on: Option<String>,
    pub status: Option<String>,
    pub hour_meter: Option<f64>,
    pub acquisition_value: Option<f64>,
    pub notes: Option<String>,
}

/// GET /api/v1/equipment
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<EquipmentFilter>,
) -> AppResult<impl IntoResponse> {
    let data = EquipmentRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/equipment
pub async fn create(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Json(input): Json<CreateEquipmentRequest>,
) -> AppResult<impl IntoResponse> {
    let internal_code = require_text("internal_code", input.internal_code.as_deref())?;
    let name = require_text("name", input.name.as_deref())?;
    let equipment_type_id = require("equipment_type_id", input.equipment_type_id)?;
    let model = require_text("model", input.model.as_deref())?;
    let manufacturer = require_text("manufacturer", input.manufacturer.as_deref())?;
    let serial_number = require_text("serial_number", input.serial_number.as_deref())?;
    let location = require_text("location", input.location.as_deref())?;
    let acquired_on = parse_date(
        "acquired_on",
        &require_text("acquired_on", input.acquired_on.as_deref())?,
    )?;
    let status = optional_text(input.status.as_deref()).unwrap_or_else(|| STATUS_ACTIVE.into());
    validate_status(&status)?;
    let hour_meter = input.hour_meter.unwrap_or(0.0);
    validate_non_negative("hour_meter", hour_meter)?;

    if EquipmentTypeRepo::find_by_id(&state.pool, equipment_type_id)
        .await?
        .is_none()
    {
        return Err(not_found("EquipmentType", equipment_type_id));
    }
    if EquipmentRepo::code_taken(&state.pool, &internal_code).await? {
        return Err(AppError::BadRequest(format!(
            "Internal code '{internal_code}' is already in use"
        )));
    }
    if EquipmentRepo::serial_taken(&state.pool, &serial_number).await? {
        return Err(AppError::BadRequest(format!(
            "Serial number '{serial_number}' is already in use"
        )));
    }

    let equipment = EquipmentRepo::create(
        &state.pool,
        &CreateEquipment {
            internal_code,
            name,
            equipment_type_id,
            model,
            manufacturer,
            serial_number,
            location,
            acquired_on,
            status,
            hour_meter,
            acquisition_value: input.acquisition_value,
            notes: optional_text(input.notes.as_deref()),
        },
    )
    .await?;

    tracing::info!(
        equipment_id = equipment.id,
        internal_code = %equipment.internal_code,
        user_id = user.user_id,
        "Equipment registered",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: equipment })))
}

/// GET /api/v1/equipment/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = EquipmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Equipment", id))?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/equipment/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEquipment>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = input.status.as_deref() {
        validate_status(status)?;
    }
    if let Some(hm) = input.hour_meter {
        validate_non_negative("hour_meter", hm)?;
    }
    if let Some(type_id) = input.equipment_type_id {
        if EquipmentTypeRepo::find_by_id(&state.pool, type_id).await?.is_none() {
            return Err(not_found("EquipmentType", type_id));
        }
    }
    let data = EquipmentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Equipment", id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/equipment/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let orders = EquipmentRepo::work_order_count(&state.pool, id).await?;
    if orders > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete equipment: it has {orders} work orders"
        )));
    }
    if !EquipmentRepo::delete(&state.pool, id).await? {
        return Err(not_found("Equipment", id));
    }
    tracing::info!(equipment_id = id, user_id = user.user_id, "Equipment deleted");
    Ok(Json(MessageResponse::new("Equipment deleted")))
}
