//! Handlers for the `/oil-analyses` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use cmms_core::oil_analysis::{
    check_can_complete, check_can_delete, validate_parameters, validate_priority,
    validate_status, PRIORITY_NORMAL, STATUS_COLLECTED,
};
use cmms_core::types::{DbId, Timestamp};
use cmms_core::validation::{optional_text, require, require_text};
use cmms_db::models::dashboard::LabelCount;
use cmms_db::models::oil_analysis::{
    CompleteOilAnalysis, CreateOilAnalysis, OilAnalysis, OilAnalysisFilter, UpdateOilAnalysis,
};
use cmms_db::repositories::{EquipmentRepo, OilAnalysisRepo};
use serde::{Deserialize, Serialize};

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequirePlanner;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

const TOP_EQUIPMENT_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct CreateOilAnalysisRequest {
    pub equipment_id: Option<DbId>,
    pub sample_number: Option<String>,
    pub collected_at: Option<Timestamp>,
    pub hour_meter_at_collection: Option<f64>,
    pub oil_type: Option<String>,
    pub laboratory: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub collected_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteOilAnalysisRequest {
    pub diagnosis: Option<String>,
    pub recommended_action: Option<String>,
    pub executed_action: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub lab_result_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct OilAnalysisReport {
    pub by_status: Vec<LabelCount>,
    pub by_priority: Vec<LabelCount>,
    pub top_equipment: Vec<LabelCount>,
}

async fn load(state: &AppState, id: DbId) -> AppResult<OilAnalysis> {
    OilAnalysisRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("OilAnalysis", id))
}

/// GET /api/v1/oil-analyses
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<OilAnalysisFilter>,
) -> AppResult<impl IntoResponse> {
    let data = OilAnalysisRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/oil-analyses
pub async fn create(
    State(state): State<AppState>,
    RequirePlanner(user): RequirePlanner,
    Json(input): Json<CreateOilAnalysisRequest>,
) -> AppResult<impl IntoResponse> {
    let equipment_id = require("equipment_id", input.equipment_id)?;
    let sample_number = require_text("sample_number", input.sample_number.as_deref())?;
    let collected_at = require("collected_at", input.collected_at)?;
    let status = optional_text(input.status.as_deref()).unwrap_or_else(|| STATUS_COLLECTED.into());
    let priority =
        optional_text(input.priority.as_deref()).unwrap_or_else(|| PRIORITY_NORMAL.into());
    validate_status(&status)?;
    validate_priority(&priority)?;
    if let Some(params) = &input.parameters {
        validate_parameters(params)?;
    }

    if EquipmentRepo::find_by_id(&state.pool, equipment_id).await?.is_none() {
        return Err(not_found("Equipment", equipment_id));
    }
    if OilAnalysisRepo::sample_taken(&state.pool, &sample_number).await? {
        return Err(AppError::BadRequest(format!(
            "Sample number '{sample_number}' is already registered"
        )));
    }

    let collected_by = optional_text(input.collected_by.as_deref())
        .unwrap_or_else(|| user.user.full_name.clone());
    let analysis = OilAnalysisRepo::create(
        &state.pool,
        &CreateOilAnalysis {
            equipment_id,
            sample_number,
            collected_at,
            hour_meter_at_collection: input.hour_meter_at_collection,
            oil_type: optional_text(input.oil_type.as_deref()),
            laboratory: optional_text(input.laboratory.as_deref()),
            parameters: input.parameters,
            status,
            priority,
            collected_by: Some(collected_by),
            notes: optional_text(input.notes.as_deref()),
        },
    )
    .await?;

    tracing::info!(
        analysis_id = analysis.id,
        sample = %analysis.sample_number,
        user_id = user.user_id,
        "Oil sample registered",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: analysis })))
}

/// GET /api/v1/oil-analyses/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = load(&state, id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/oil-analyses/{id}
pub async fn update(
    State(state): State<AppState>,
    RequirePlanner(_user): RequirePlanner,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOilAnalysis>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = input.status.as_deref() {
        validate_status(status)?;
    }
    if let Some(priority) = input.priority.as_deref() {
        validate_priority(priority)?;
    }
    if let Some(params) = &input.parameters {
        validate_parameters(params)?;
    }
    let data = OilAnalysisRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("OilAnalysis", id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/oil-analyses/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequirePlanner(user): RequirePlanner,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let analysis = load(&state, id).await?;
    check_can_delete(&analysis.status)?;
    if !OilAnalysisRepo::delete(&state.pool, id).await? {
        return Err(not_found("OilAnalysis", id));
    }
    tracing::info!(analysis_id = id, user_id = user.user_id, "Oil analysis deleted");
    Ok(Json(MessageResponse::new("Oil analysis deleted")))
}

/// PUT /api/v1/oil-analyses/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    RequirePlanner(user): RequirePlanner,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteOilAnalysisRequest>,
) -> AppResult<impl IntoResponse> {
    let analysis = load(&state, id).await?;
    check_can_complete(&analysis.status)?;
    let diagnosis = require_text("diagnosis", input.diagnosis.as_deref())?;
    if let Some(params) = &input.parameters {
        validate_parameters(params)?;
    }

    let completed = OilAnalysisRepo::complete(
        &state.pool,
        id,
        &CompleteOilAnalysis {
            diagnosis,
            recommended_action: optional_text(input.recommended_action.as_deref()),
            executed_action: optional_text(input.executed_action.as_deref()),
            parameters: input.parameters,
            lab_result_at: input.lab_result_at.unwrap_or_else(Utc::now),
            analyzed_by: user.user.full_name.clone(),
        },
    )
    .await?
    .ok_or_else(|| not_found("OilAnalysis", id))?;

    tracing::info!(analysis_id = id, user_id = user.user_id, "Oil analysis completed");
    Ok(Json(DataResponse { data: completed }))
}

/// GET /api/v1/oil-analyses/report
pub async fn report(State(state): State<AppState>, _auth: AuthUser) -> AppResult<impl IntoResponse> {
    let by_status = OilAnalysisRepo::count_by_status(&state.pool).await?;
    let by_priority = OilAnalysisRepo::count_by_priority(&state.pool).await?;
    let top_equipment = OilAnalysisRepo::top_equipment(&state.pool, TOP_EQUIPMENT_LIMIT).await?;
    Ok(Json(DataResponse {
        data: OilAnalysisReport {
            by_status,
            by_priority,
            top_equipment,
        },
    }))
}
