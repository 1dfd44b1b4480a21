//! Handlers for the `/mechanics` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::mechanic::{
    validate_experience_level, validate_status, Performance, LEVEL_JUNIOR, STATUS_ACTIVE,
};
use cmms_core::types::DbId;
use cmms_core::validation::{optional_text, parse_date, require_text, validate_email};
use cmms_db::models::mechanic::{CreateMechanic, MechanicFilter, UpdateMechanic};
use cmms_db::repositories::MechanicRepo;
use serde::Deserialize;

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMechanicRequest {
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub experience_level: Option<String>,
    pub salary: Option<f64>,
    pub hired_on: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/v1/mechanics
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<MechanicFilter>,
) -> AppResult<impl IntoResponse> {
    let data = MechanicRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/mechanics
pub async fn create(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Json(input): Json<CreateMechanicRequest>,
) -> AppResult<impl IntoResponse> {
    let full_name = require_text("full_name", input.full_name.as_deref())?;
    let national_id = require_text("national_id", input.national_id.as_deref())?;
    let hired_on = parse_date("hired_on", &require_text("hired_on", input.hired_on.as_deref())?)?;

    let email = optional_text(input.email.as_deref());
    if let Some(email) = email.as_deref() {
        validate_email(email)?;
    }
    let experience_level =
        optional_text(input.experience_level.as_deref()).unwrap_or_else(|| LEVEL_JUNIOR.into());
    validate_experience_level(&experience_level)?;
    let status = optional_text(input.status.as_deref()).unwrap_or_else(|| STATUS_ACTIVE.into());
    validate_status(&status)?;

    let mechanic = MechanicRepo::create(
        &state.pool,
        &CreateMechanic {
            full_name,
            national_id,
            phone: optional_text(input.phone.as_deref()),
            email,
            specialty: optional_text(input.specialty.as_deref()),
            experience_level,
            salary: input.salary,
            hired_on,
            status,
            notes: optional_text(input.notes.as_deref()),
        },
    )
    .await?;

    tracing::info!(mechanic_id = mechanic.id, user_id = user.user_id, "Mechanic registered");
    Ok((StatusCode::CREATED, Json(DataResponse { data: mechanic })))
}

/// GET /api/v1/mechanics/specialties
pub async fn specialties(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let data = MechanicRepo::specialties(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/mechanics/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = MechanicRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Mechanic", id))?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/mechanics/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMechanic>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = input.status.as_deref() {
        validate_status(status)?;
    }
    if let Some(level) = input.experience_level.as_deref() {
        validate_experience_level(level)?;
    }
    if let Some(email) = input.email.as_deref() {
        validate_email(email)?;
    }
    let data = MechanicRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Mechanic", id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/mechanics/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let orders = MechanicRepo::work_order_count(&state.pool, id).await?;
    if orders > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete mechanic: assigned to {orders} work orders"
        )));
    }
    if !MechanicRepo::delete(&state.pool, id).await? {
        return Err(not_found("Mechanic", id));
    }
    tracing::info!(mechanic_id = id, user_id = user.user_id, "Mechanic deleted");
    Ok(Json(MessageResponse::new("Mechanic deleted")))
}

/// GET /api/v1/mechanics/{id}/performance
pub async fn performance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if MechanicRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found("Mechanic", id));
    }
    let totals = MechanicRepo::performance_totals(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: Performance::from(totals),
    }))
}
