//! Handlers for the `/work-orders` resource.
//!
//! Orders open as `open`, move to `in_progress` through `/start`, and close
//! through `/complete`, which consumes parts from stock in one transaction.
//! The general PUT never completes an order.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use cmms_core::access::AccessLevel;
use cmms_core::alert::{sort_by_severity, Alert};
use cmms_core::numeric::round2;
use cmms_core::types::{DbId, Timestamp};
use cmms_core::validation::{optional_text, require, require_text, validate_non_negative};
use cmms_core::work_order::{
    check_can_complete, check_can_delete, check_can_start, mechanic_alert, order_alerts,
    validate_priority, validate_type, WorkOrderStatus, ORIGIN_MANUAL,
};
use cmms_db::models::catalog::MaintenanceType;
use cmms_db::models::equipment::Equipment;
use cmms_db::models::mechanic::Mechanic;
use cmms_db::models::work_order::{
    CompleteWorkOrder, CreateWorkOrder, PartUsage, UpdateWorkOrder, WorkOrder, WorkOrderFilter,
    WorkOrderPart,
};
use cmms_db::repositories::{EquipmentRepo, MaintenanceTypeRepo, MechanicRepo, WorkOrderRepo};
use serde::{Deserialize, Serialize};

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireMechanic, RequirePlanner, RequireSupervisor};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateWorkOrderRequest {
    pub equipment_id: Option<DbId>,
    pub mechanic_id: Option<DbId>,
    pub maintenance_type_id: Option<DbId>,
    pub order_type: Option<String>,
    pub priority: Option<String>,
    pub problem_description: Option<String>,
    pub due_at: Option<Timestamp>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteWorkOrderRequest {
    pub solution_description: Option<String>,
    pub labor_cost: Option<f64>,
    #[serde(default)]
    pub parts_used: Vec<PartUsage>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MechanicAlertsQuery {
    pub mechanic_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct WorkOrderParts {
    pub parts: Vec<WorkOrderPart>,
    pub total_cost: f64,
}

#[derive(Debug, Serialize)]
pub struct AlertList<T> {
    pub alerts: Vec<T>,
    pub total: usize,
}

/// A mechanic alert tagged with the order it belongs to.
#[derive(Debug, Serialize)]
pub struct MechanicAlert {
    pub work_order_id: DbId,
    pub number: String,
    pub equipment_name: Option<String>,
    pub priority: String,
    #[serde(flatten)]
    pub alert: Alert,
}

#[derive(Debug, Serialize)]
pub struct MechanicAlerts {
    pub mechanic: Option<Mechanic>,
    pub alerts: Vec<MechanicAlert>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CostTotals {
    pub labor_cost: f64,
    pub parts_cost: f64,
    pub total_cost: f64,
}

/// Everything needed to render a printable work-order sheet.
#[derive(Debug, Serialize)]
pub struct WorkOrderSheet {
    pub order: WorkOrder,
    pub equipment: Option<Equipment>,
    pub mechanic: Option<Mechanic>,
    pub maintenance_type: Option<MaintenanceType>,
    pub parts: Vec<WorkOrderPart>,
    pub totals: CostTotals,
    pub signatures: [&'static str; 3],
    pub printed_at: Timestamp,
}

const SIGNATURE_LABELS: [&str; 3] = ["Mechanic", "Supervisor", "Equipment operator"];

async fn load(state: &AppState, id: DbId) -> AppResult<WorkOrder> {
    WorkOrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("WorkOrder", id))
}

async fn ensure_links(
    state: &AppState,
    mechanic_id: Option<DbId>,
    maintenance_type_id: Option<DbId>,
) -> AppResult<()> {
    if let Some(mid) = mechanic_id {
        if MechanicRepo::find_by_id(&state.pool, mid).await?.is_none() {
            return Err(not_found("Mechanic", mid));
        }
    }
    if let Some(tid) = maintenance_type_id {
        if MaintenanceTypeRepo::find_by_id(&state.pool, tid).await?.is_none() {
            return Err(not_found("MaintenanceType", tid));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/work-orders
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<WorkOrderFilter>,
) -> AppResult<impl IntoResponse> {
    let data = WorkOrderRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/work-orders
pub async fn create(
    State(state): State<AppState>,
    RequirePlanner(user): RequirePlanner,
    Json(input): Json<CreateWorkOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let equipment_id = require("equipment_id", input.equipment_id)?;
    let order_type = require_text("order_type", input.order_type.as_deref())?;
    let priority = require_text("priority", input.priority.as_deref())?;
    let problem_description =
        require_text("problem_description", input.problem_description.as_deref())?;
    validate_type(&order_type)?;
    validate_priority(&priority)?;

    if EquipmentRepo::find_by_id(&state.pool, equipment_id).await?.is_none() {
        return Err(not_found("Equipment", equipment_id));
    }
    ensure_links(&state, input.mechanic_id, input.maintenance_type_id).await?;

    let order = WorkOrderRepo::create(
        &state.pool,
        &CreateWorkOrder {
            equipment_id,
            mechanic_id: input.mechanic_id,
            maintenance_type_id: input.maintenance_type_id,
            order_type,
            priority,
            origin: ORIGIN_MANUAL.to_string(),
            problem_description,
            due_at: input.due_at,
            notes: optional_text(input.notes.as_deref()),
            created_by: Some(user.user_id),
        },
    )
    .await?;

    tracing::info!(
        work_order_id = order.id,
        number = %order.number,
        user_id = user.user_id,
        "Work order opened",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: order })))
}

/// GET /api/v1/work-orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = load(&state, id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/work-orders/{id}
pub async fn update(
    State(state): State<AppState>,
    RequirePlanner(user): RequirePlanner,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorkOrder>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = input.status.as_deref() {
        if WorkOrderStatus::from_str(status)? == WorkOrderStatus::Completed {
            return Err(AppError::BadRequest(
                "Use the complete endpoint to close a work order".to_string(),
            ));
        }
    }
    if let Some(order_type) = input.order_type.as_deref() {
        validate_type(order_type)?;
    }
    if let Some(priority) = input.priority.as_deref() {
        validate_priority(priority)?;
    }
    if let Some(labor) = input.labor_cost {
        validate_non_negative("labor_cost", labor)?;
    }
    ensure_links(&state, input.mechanic_id, input.maintenance_type_id).await?;

    let order = WorkOrderRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("WorkOrder", id))?;
    tracing::info!(work_order_id = id, status = %order.status, user_id = user.user_id, "Work order updated");
    Ok(Json(DataResponse { data: order }))
}

/// DELETE /api/v1/work-orders/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = load(&state, id).await?;
    check_can_delete(WorkOrderStatus::from_str(&order.status)?)?;
    if !WorkOrderRepo::delete(&state.pool, id).await? {
        return Err(not_found("WorkOrder", id));
    }
    tracing::info!(work_order_id = id, number = %order.number, user_id = user.user_id, "Work order deleted");
    Ok(Json(MessageResponse::new("Work order deleted")))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// PUT /api/v1/work-orders/{id}/start
pub async fn start(
    State(state): State<AppState>,
    RequireMechanic(user): RequireMechanic,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = load(&state, id).await?;
    check_can_start(WorkOrderStatus::from_str(&order.status)?)?;

    let assignee = match (order.mechanic_id, user.level) {
        (None, AccessLevel::Mechanic) => MechanicRepo::find_by_email(&state.pool, &user.user.email)
            .await?
            .map(|m| m.id),
        _ => None,
    };

    let order = WorkOrderRepo::start(&state.pool, id, assignee)
        .await?
        .ok_or_else(|| not_found("WorkOrder", id))?;
    tracing::info!(
        work_order_id = id,
        mechanic_id = ?order.mechanic_id,
        user_id = user.user_id,
        "Work order started",
    );
    Ok(Json(DataResponse { data: order }))
}

/// PUT /api/v1/work-orders/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    RequireMechanic(user): RequireMechanic,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteWorkOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let order = load(&state, id).await?;
    check_can_complete(WorkOrderStatus::from_str(&order.status)?)?;
    let solution_description =
        require_text("solution_description", input.solution_description.as_deref())?;
    let labor_cost = input.labor_cost.unwrap_or(0.0);
    validate_non_negative("labor_cost", labor_cost)?;

    let completed = WorkOrderRepo::complete(
        &state.pool,
        id,
        &CompleteWorkOrder {
            solution_description,
            labor_cost,
            notes: optional_text(input.notes.as_deref()),
            parts_used: input.parts_used,
            user_id: user.user_id,
            closed_at: Utc::now(),
        },
    )
    .await?
    .ok_or_else(|| not_found("WorkOrder", id))?;

    tracing::info!(
        work_order_id = id,
        number = %completed.number,
        total_cost = completed.total_cost,
        user_id = user.user_id,
        "Work order completed",
    );
    Ok(Json(DataResponse { data: completed }))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/work-orders/{id}/parts
pub async fn parts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load(&state, id).await?;
    let parts = WorkOrderRepo::parts(&state.pool, id).await?;
    let total_cost = round2(parts.iter().map(|p| p.total_cost).sum());
    Ok(Json(DataResponse {
        data: WorkOrderParts { parts, total_cost },
    }))
}

/// GET /api/v1/work-orders/{id}/alerts
pub async fn alerts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = load(&state, id).await?;
    let mut alerts = order_alerts(
        WorkOrderStatus::from_str(&order.status)?,
        &order.priority,
        order.due_at,
        Utc::now(),
    );
    sort_by_severity(&mut alerts, |a| a.severity);
    let total = alerts.len();
    Ok(Json(DataResponse {
        data: AlertList { alerts, total },
    }))
}

/// GET /api/v1/work-orders/mechanic-alerts
///
/// Mechanics see their own orders, matched by email. Supervisors may pass
/// `?mechanic_id=` to look at anyone's.
pub async fn mechanic_alerts(
    State(state): State<AppState>,
    RequireMechanic(user): RequireMechanic,
    Query(query): Query<MechanicAlertsQuery>,
) -> AppResult<impl IntoResponse> {
    let mechanic = match query.mechanic_id {
        Some(mid) if user.level.allows_supervisor() => Some(
            MechanicRepo::find_by_id(&state.pool, mid)
                .await?
                .ok_or_else(|| not_found("Mechanic", mid))?,
        ),
        _ => MechanicRepo::find_by_email(&state.pool, &user.user.email).await?,
    };

    let Some(mechanic) = mechanic else {
        return Ok(Json(DataResponse {
            data: MechanicAlerts {
                mechanic: None,
                alerts: Vec::new(),
                total: 0,
            },
        }));
    };

    let now = Utc::now();
    let mut alerts = Vec::new();
    for order in WorkOrderRepo::list_active_for_mechanic(&state.pool, mechanic.id).await? {
        let status = WorkOrderStatus::from_str(&order.status)?;
        if let Some(alert) =
            mechanic_alert(status, &order.priority, order.opened_at, order.started_at, now)
        {
            alerts.push(MechanicAlert {
                work_order_id: order.id,
                number: order.number,
                equipment_name: order.equipment_name,
                priority: order.priority,
                alert,
            });
        }
    }
    sort_by_severity(&mut alerts, |a| a.alert.severity);

    let total = alerts.len();
    Ok(Json(DataResponse {
        data: MechanicAlerts {
            mechanic: Some(mechanic),
            alerts,
            total,
        },
    }))
}

/// GET /api/v1/work-orders/{id}/print
pub async fn print(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = load(&state, id).await?;
    let equipment = EquipmentRepo::find_by_id(&state.pool, order.equipment_id).await?;
    let mechanic = match order.mechanic_id {
        Some(mid) => MechanicRepo::find_by_id(&state.pool, mid).await?,
        None => None,
    };
    let maintenance_type = match order.maintenance_type_id {
        Some(tid) => MaintenanceTypeRepo::find_by_id(&state.pool, tid).await?,
        None => None,
    };
    let parts = WorkOrderRepo::parts(&state.pool, id).await?;
    let totals = CostTotals {
        labor_cost: order.labor_cost,
        parts_cost: order.parts_cost,
        total_cost: order.total_cost,
    };

    Ok(Json(DataResponse {
        data: WorkOrderSheet {
            order,
            equipment,
            mechanic,
            maintenance_type,
            parts,
            totals,
            signatures: SIGNATURE_LABELS,
            printed_at: Utc::now(),
        },
    }))
}
