//! Handlers for the `/preventive-plans` resource.
//!
//! The schedule projection and due check live in `cmms_core::preventive`;
//! these handlers merge request fields into a [`Schedule`], re-project it
//! when needed and persist the result.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use cmms_core::preventive::{
    validate_intervals, validate_lead_days, work_order_description, Schedule, DEFAULT_LEAD_DAYS,
};
use cmms_core::types::{DbId, Timestamp};
use cmms_core::validation::{optional_text, require, require_text};
use cmms_core::work_order::{
    validate_priority, ORIGIN_PREVENTIVE_AUTO, PRIORITY_MEDIUM, TYPE_PREVENTIVE,
};
use cmms_db::models::preventive_plan::{
    CreatePreventivePlan, PreventivePlan, PreventivePlanFilter, PreventivePlanResponse,
    UpdatePreventivePlan,
};
use cmms_db::models::work_order::{CreateWorkOrder, WorkOrder};
use cmms_db::repositories::{EquipmentRepo, MaintenanceTypeRepo, PreventivePlanRepo};
use serde::{Deserialize, Serialize};

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequirePlanner, RequireSupervisor};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub equipment_id: Option<DbId>,
    pub maintenance_type_id: Option<DbId>,
    pub interval_hours: Option<i32>,
    pub interval_days: Option<i32>,
    pub interval_km: Option<f64>,
    pub lead_days: Option<i32>,
    pub priority: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    pub km_current: Option<f64>,
    pub create_work_order: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct Execution {
    pub plan: PreventivePlanResponse,
    pub work_order: Option<WorkOrder>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedOrders {
    pub work_orders_created: usize,
    pub work_orders: Vec<WorkOrder>,
}

async fn load(state: &AppState, id: DbId) -> AppResult<PreventivePlan> {
    PreventivePlanRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("PreventivePlan", id))
}

/// Work order opened for a plan execution.
fn plan_work_order(
    plan: &PreventivePlan,
    due_at: Option<Timestamp>,
    user_id: Option<DbId>,
) -> CreateWorkOrder {
    CreateWorkOrder {
        equipment_id: plan.equipment_id,
        mechanic_id: None,
        maintenance_type_id: Some(plan.maintenance_type_id),
        order_type: TYPE_PREVENTIVE.to_string(),
        priority: plan.priority.clone(),
        origin: ORIGIN_PREVENTIVE_AUTO.to_string(),
        problem_description: work_order_description(&plan.name),
        due_at,
        notes: None,
        created_by: user_id,
    }
}

/// Merge an update into the stored schedule. Returns whether the projection
/// has to be recomputed.
fn merge_schedule(current: &Schedule, input: &UpdatePreventivePlan) -> (Schedule, bool) {
    let mut next = current.clone();
    if input.interval_hours.is_some() {
        next.interval_hours = input.interval_hours;
    }
    if input.interval_days.is_some() {
        next.interval_days = input.interval_days;
    }
    if input.interval_km.is_some() {
        next.interval_km = input.interval_km;
    }
    if let Some(lead) = input.lead_days {
        next.lead_days = lead;
    }
    if let Some(active) = input.is_active {
        next.is_active = active;
    }
    let intervals_changed = next.interval_hours != current.interval_hours
        || next.interval_days != current.interval_days
        || next.interval_km != current.interval_km;
    let reactivated = next.is_active && !current.is_active;
    (next, intervals_changed || reactivated)
}

/// GET /api/v1/preventive-plans
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<PreventivePlanFilter>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let data: Vec<PreventivePlanResponse> = PreventivePlanRepo::list(&state.pool, &filter)
        .await?
        .into_iter()
        .map(|p| PreventivePlanResponse::new(p, now))
        .filter(|p| filter.due.map_or(true, |due| p.is_due == due))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/preventive-plans
pub async fn create(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Json(input): Json<CreatePlanRequest>,
) -> AppResult<impl IntoResponse> {
    let name = require_text("name", input.name.as_deref())?;
    let equipment_id = require("equipment_id", input.equipment_id)?;
    let maintenance_type_id = require("maintenance_type_id", input.maintenance_type_id)?;
    validate_intervals(input.interval_hours, input.interval_days, input.interval_km)?;
    let priority =
        optional_text(input.priority.as_deref()).unwrap_or_else(|| PRIORITY_MEDIUM.into());
    validate_priority(&priority)?;
    let lead_days = input.lead_days.unwrap_or(DEFAULT_LEAD_DAYS);
    validate_lead_days(lead_days)?;

    let equipment = EquipmentRepo::find_by_id(&state.pool, equipment_id)
        .await?
        .ok_or_else(|| not_found("Equipment", equipment_id))?;
    if MaintenanceTypeRepo::find_by_id(&state.pool, maintenance_type_id)
        .await?
        .is_none()
    {
        return Err(not_found("MaintenanceType", maintenance_type_id));
    }

    let mut schedule = Schedule {
        is_active: input.is_active.unwrap_or(true),
        interval_hours: input.interval_hours,
        interval_days: input.interval_days,
        interval_km: input.interval_km,
        lead_days,
        ..Default::default()
    };
    let now = Utc::now();
    schedule.compute_next_due(now, Some(equipment.hour_meter))?;

    let plan = PreventivePlanRepo::create(
        &state.pool,
        &CreatePreventivePlan {
            name,
            description: optional_text(input.description.as_deref()),
            equipment_id,
            maintenance_type_id,
            priority,
            schedule,
        },
    )
    .await?;

    tracing::info!(plan_id = plan.id, equipment_id, user_id = user.user_id, "Preventive plan created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PreventivePlanResponse::new(plan, now),
        }),
    ))
}

/// GET /api/v1/preventive-plans/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let plan = load(&state, id).await?;
    Ok(Json(DataResponse {
        data: PreventivePlanResponse::new(plan, Utc::now()),
    }))
}

/// PUT /api/v1/preventive-plans/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePreventivePlan>,
) -> AppResult<impl IntoResponse> {
    if let Some(priority) = input.priority.as_deref() {
        validate_priority(priority)?;
    }
    if let Some(lead) = input.lead_days {
        validate_lead_days(lead)?;
    }
    if let Some(type_id) = input.maintenance_type_id {
        if MaintenanceTypeRepo::find_by_id(&state.pool, type_id).await?.is_none() {
            return Err(not_found("MaintenanceType", type_id));
        }
    }
    let plan = load(&state, id).await?;
    let (mut schedule, reproject) = merge_schedule(&plan.schedule(), &input);
    validate_intervals(schedule.interval_hours, schedule.interval_days, schedule.interval_km)?;

    let now = Utc::now();
    if reproject {
        schedule.compute_next_due(now, plan.equipment_hour_meter)?;
    }
    let updated = PreventivePlanRepo::update(&state.pool, id, &input, &schedule)
        .await?
        .ok_or_else(|| not_found("PreventivePlan", id))?;
    Ok(Json(DataResponse {
        data: PreventivePlanResponse::new(updated, now),
    }))
}

/// DELETE /api/v1/preventive-plans/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !PreventivePlanRepo::delete(&state.pool, id).await? {
        return Err(not_found("PreventivePlan", id));
    }
    tracing::info!(plan_id = id, user_id = user.user_id, "Preventive plan deleted");
    Ok(Json(MessageResponse::new("Preventive plan deleted")))
}

/// POST /api/v1/preventive-plans/{id}/execute
pub async fn execute(
    State(state): State<AppState>,
    RequirePlanner(user): RequirePlanner,
    Path(id): Path<DbId>,
    input: Option<Json<ExecuteRequest>>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = input.unwrap_or_default();
    let plan = load(&state, id).await?;
    let now = Utc::now();

    let mut schedule = plan.schedule();
    schedule.record_execution(now, plan.equipment_hour_meter, input.km_current)?;

    let order = input
        .create_work_order
        .unwrap_or(true)
        .then(|| plan_work_order(&plan, schedule.next_due_at, Some(user.user_id)));
    let (plan, work_order) =
        PreventivePlanRepo::execute(&state.pool, id, &schedule, order.as_ref()).await?;

    tracing::info!(
        plan_id = id,
        work_order = ?work_order.as_ref().map(|w| w.number.as_str()),
        user_id = user.user_id,
        "Preventive plan executed",
    );
    Ok(Json(DataResponse {
        data: Execution {
            plan: PreventivePlanResponse::new(plan, now),
            work_order,
        },
    }))
}

/// POST /api/v1/preventive-plans/generate-pending
pub async fn generate_pending(
    State(state): State<AppState>,
    RequirePlanner(user): RequirePlanner,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let filter = PreventivePlanFilter {
        is_active: Some(true),
        ..Default::default()
    };
    let orders: Vec<CreateWorkOrder> = PreventivePlanRepo::list(&state.pool, &filter)
        .await?
        .iter()
        .filter(|plan| plan.is_due(now))
        .map(|plan| plan_work_order(plan, plan.next_due_at, Some(user.user_id)))
        .collect();

    let work_orders = PreventivePlanRepo::generate_work_orders(&state.pool, &orders).await?;
    tracing::info!(
        due_plans = orders.len(),
        created = work_orders.len(),
        user_id = user.user_id,
        "Preventive work orders generated",
    );
    Ok(Json(DataResponse {
        data: GeneratedOrders {
            work_orders_created: work_orders.len(),
            work_orders,
        },
    }))
}
