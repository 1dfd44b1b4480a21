//! Handlers for the `/tires` resource.
//!
//! Descriptive fields change through PUT; status and mounting change only
//! through the lifecycle endpoints (install, remove, treatment, retread
//! return), each of which locks the tire, applies the transition to a
//! [`TireLifecycle`] and writes it back in the same transaction. All writes
//! need supervisor.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use cmms_core::alert::{sort_by_severity, Alert};
use cmms_core::error::CoreError;
use cmms_core::numeric::{percentage, round2};
use cmms_core::tire::{
    append_note, check_can_delete, check_can_install, check_can_remove,
    check_can_return_from_retread, check_can_update_mileage, removal_status, tread_note,
    treatment_note, validate_mileage, validate_type, wear_alerts, Treatment, HIGH_WEAR_PERCENT,
    STATUS_DISCARDED, STATUS_IN_USE, STATUS_STOCK, TYPE_RETREADED,
};
use cmms_core::types::DbId;
use cmms_core::validation::{
    optional_text, parse_date, require, require_text, validate_non_negative,
};
use cmms_db::models::dashboard::LabelCount;
use cmms_db::models::tire::{
    BrandPerformance, CreateTire, Tire, TireFilter, TireLifecycle, TireResponse, UpdateTire,
};
use cmms_db::repositories::{EquipmentRepo, TireRepo};
use serde::{Deserialize, Serialize};

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// Number of tires listed in the mileage ranking.
const TOP_BY_KM_LIMIT: i64 = 5;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateTireRequest {
    pub serial_number: Option<String>,
    pub fire_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub size: Option<String>,
    pub tire_type: Option<String>,
    pub purchased_on: Option<String>,
    pub purchase_value: Option<f64>,
    pub recommended_pressure: Option<f64>,
    pub estimated_life_km: Option<f64>,
    pub tread_depth_mm: Option<f64>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstallRequest {
    pub equipment_id: Option<DbId>,
    pub position: Option<String>,
    pub km_at_install: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub reason: Option<String>,
    pub km_removal: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MileageRequest {
    pub km_current: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TreatmentRequest {
    pub treatment: Option<String>,
    pub retread_supplier: Option<String>,
    pub discard_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RetreadReturnRequest {
    pub tread_depth_mm: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TreadRequest {
    pub tread_depth_mm: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TireReport {
    pub by_status: Vec<LabelCount>,
    pub by_brand: Vec<LabelCount>,
    pub high_wear: Vec<TireResponse>,
    pub stock_value: f64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct BrandSummary {
    pub brand: String,
    pub total: i64,
    pub in_use: i64,
    pub discarded: i64,
    pub retreaded: i64,
    pub total_km: f64,
    pub total_value: f64,
    pub average_km: f64,
    pub discard_rate: f64,
    pub retread_rate: f64,
}

impl From<BrandPerformance> for BrandSummary {
    fn from(b: BrandPerformance) -> Self {
        let total = b.total as f64;
        let average_km = if b.total > 0 {
            round2(b.total_km / total)
        } else {
            0.0
        };
        Self {
            discard_rate: percentage(b.discarded as f64, total),
            retread_rate: percentage(b.retreaded as f64, total),
            average_km,
            total_km: round2(b.total_km),
            total_value: round2(b.total_value),
            brand: b.brand,
            total: b.total,
            in_use: b.in_use,
            discarded: b.discarded,
            retreaded: b.retreaded,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PerformanceReport {
    pub brands: Vec<BrandSummary>,
    pub top_by_km: Vec<TireResponse>,
}

/// A wear alert tagged with the tire it belongs to.
#[derive(Debug, Serialize)]
pub struct TireAlert {
    pub tire_id: DbId,
    pub serial_number: String,
    pub equipment_name: Option<String>,
    pub position: Option<String>,
    #[serde(flatten)]
    pub alert: Alert,
}

#[derive(Debug, Serialize)]
pub struct TireAlerts {
    pub alerts: Vec<TireAlert>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load(state: &AppState, id: DbId) -> AppResult<Tire> {
    TireRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Tire", id))
}

/// Run a lifecycle transition against the locked row.
async fn transition<F>(state: &AppState, id: DbId, apply: F) -> AppResult<TireResponse>
where
    F: FnOnce(&Tire) -> Result<TireLifecycle, CoreError> + Send,
{
    let tire = TireRepo::transition(&state.pool, id, apply)
        .await?
        .ok_or_else(|| not_found("Tire", id))?;
    Ok(TireResponse::from(tire))
}

fn clear_mounting(lc: &mut TireLifecycle) {
    lc.equipment_id = None;
    lc.position = None;
}

fn data(tire: TireResponse) -> Json<DataResponse<TireResponse>> {
    Json(DataResponse { data: tire })
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/tires
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<TireFilter>,
) -> AppResult<impl IntoResponse> {
    let tires = TireRepo::list(&state.pool, &filter).await?;
    let data: Vec<TireResponse> = tires.into_iter().map(TireResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/tires
pub async fn create(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Json(input): Json<CreateTireRequest>,
) -> AppResult<impl IntoResponse> {
    let serial_number = require_text("serial_number", input.serial_number.as_deref())?;
    let brand = require_text("brand", input.brand.as_deref())?;
    let model = require_text("model", input.model.as_deref())?;
    let size = require_text("size", input.size.as_deref())?;
    let tire_type = require_text("tire_type", input.tire_type.as_deref())?;
    validate_type(&tire_type)?;
    let purchased_on = parse_date(
        "purchased_on",
        &require_text("purchased_on", input.purchased_on.as_deref())?,
    )?;
    if let Some(depth) = input.tread_depth_mm {
        validate_non_negative("tread_depth_mm", depth)?;
    }

    if TireRepo::serial_taken(&state.pool, &serial_number).await? {
        return Err(AppError::BadRequest(format!(
            "Serial number '{serial_number}' is already registered"
        )));
    }

    let tire = TireRepo::create(
        &state.pool,
        &CreateTire {
            serial_number,
            fire_number: optional_text(input.fire_number.as_deref()),
            brand,
            model,
            size,
            tire_type,
            purchased_on,
            purchase_value: input.purchase_value,
            recommended_pressure: input.recommended_pressure,
            estimated_life_km: input.estimated_life_km,
            tread_depth_mm: input.tread_depth_mm,
            supplier: optional_text(input.supplier.as_deref()),
            notes: optional_text(input.notes.as_deref()),
        },
    )
    .await?;

    tracing::info!(tire_id = tire.id, serial = %tire.serial_number, user_id = user.user_id, "Tire registered");
    Ok((StatusCode::CREATED, data(TireResponse::from(tire))))
}

/// GET /api/v1/tires/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    Ok(data(TireResponse::from(load(&state, id).await?)))
}

/// PUT /api/v1/tires/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTire>,
) -> AppResult<impl IntoResponse> {
    let tire = TireRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Tire", id))?;
    Ok(data(TireResponse::from(tire)))
}

/// DELETE /api/v1/tires/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tire = load(&state, id).await?;
    check_can_delete(&tire.status)?;
    if !TireRepo::delete(&state.pool, id).await? {
        return Err(not_found("Tire", id));
    }
    tracing::info!(tire_id = id, user_id = user.user_id, "Tire deleted");
    Ok(Json(MessageResponse::new("Tire deleted")))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// PUT /api/v1/tires/{id}/install
pub async fn install(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<InstallRequest>,
) -> AppResult<impl IntoResponse> {
    let equipment_id = require("equipment_id", input.equipment_id)?;
    let position = require_text("position", input.position.as_deref())?;
    let equipment = EquipmentRepo::find_by_id(&state.pool, equipment_id)
        .await?
        .ok_or_else(|| not_found("Equipment", equipment_id))?;
    let km_at_install = input.km_at_install.unwrap_or(equipment.hour_meter);
    validate_non_negative("km_at_install", km_at_install)?;

    let saved = transition(&state, id, |tire| {
        check_can_install(&tire.status)?;
        let mut lc = TireLifecycle::from(tire);
        lc.status = STATUS_IN_USE.to_string();
        lc.equipment_id = Some(equipment_id);
        lc.position = Some(position);
        lc.installed_at = Some(Utc::now());
        lc.km_at_install = Some(km_at_install);
        lc.km_current = Some(km_at_install);
        Ok(lc)
    })
    .await?;

    tracing::info!(tire_id = id, equipment_id, user_id = user.user_id, "Tire installed");
    Ok(data(saved))
}

/// PUT /api/v1/tires/{id}/remove
pub async fn remove(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<RemoveRequest>,
) -> AppResult<impl IntoResponse> {
    let status = removal_status(optional_text(input.reason.as_deref()).as_deref())?;

    let saved = transition(&state, id, |tire| {
        check_can_remove(&tire.status)?;
        let mut lc = TireLifecycle::from(tire);
        if let Some(km) = input.km_removal {
            validate_mileage(km, tire.km_at_install)?;
            lc.km_current = Some(km);
        }
        lc.status = status.to_string();
        clear_mounting(&mut lc);
        if status == STATUS_DISCARDED {
            lc.discarded_at = Some(Utc::now());
        }
        Ok(lc)
    })
    .await?;

    tracing::info!(tire_id = id, status, user_id = user.user_id, "Tire removed");
    Ok(data(saved))
}

/// PUT /api/v1/tires/{id}/mileage
pub async fn update_mileage(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<MileageRequest>,
) -> AppResult<impl IntoResponse> {
    let km_current = require("km_current", input.km_current)?;
    let saved = transition(&state, id, |tire| {
        check_can_update_mileage(&tire.status)?;
        validate_mileage(km_current, tire.km_at_install)?;
        let mut lc = TireLifecycle::from(tire);
        lc.km_current = Some(km_current);
        Ok(lc)
    })
    .await?;
    Ok(data(saved))
}

/// PUT /api/v1/tires/{id}/treatment
pub async fn treatment(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<TreatmentRequest>,
) -> AppResult<impl IntoResponse> {
    let treatment = Treatment::from_str(&require_text("treatment", input.treatment.as_deref())?)?;
    treatment.validate(
        input.retread_supplier.as_deref(),
        input.discard_reason.as_deref(),
    )?;
    let now = Utc::now();

    let saved = transition(&state, id, |tire| {
        let mut lc = TireLifecycle::from(tire);
        if tire.status == STATUS_IN_USE {
            clear_mounting(&mut lc);
        }
        lc.status = treatment.target_status().to_string();
        match treatment {
            Treatment::Retread => {
                lc.retread_supplier = optional_text(input.retread_supplier.as_deref());
                lc.retreaded_at = Some(now);
            }
            Treatment::Discard => {
                lc.discard_reason = optional_text(input.discard_reason.as_deref());
                lc.discarded_at = Some(now);
            }
            Treatment::ReturnToStock => {}
        }
        lc.notes = Some(append_note(
            tire.notes.as_deref(),
            now,
            &treatment_note(treatment, input.notes.as_deref()),
        ));
        Ok(lc)
    })
    .await?;

    tracing::info!(
        tire_id = id,
        treatment = treatment.label(),
        user_id = user.user_id,
        "Tire treatment recorded",
    );
    Ok(data(saved))
}

/// PUT /api/v1/tires/{id}/retread-return
pub async fn retread_return(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<RetreadReturnRequest>,
) -> AppResult<impl IntoResponse> {
    if let Some(depth) = input.tread_depth_mm {
        validate_non_negative("tread_depth_mm", depth)?;
    }
    let text = match optional_text(input.notes.as_deref()) {
        Some(n) => format!("RETURNED FROM RETREADING - {n}"),
        None => "RETURNED FROM RETREADING".to_string(),
    };

    let saved = transition(&state, id, |tire| {
        check_can_return_from_retread(&tire.status)?;
        let mut lc = TireLifecycle::from(tire);
        lc.status = STATUS_STOCK.to_string();
        lc.tire_type = TYPE_RETREADED.to_string();
        lc.km_at_install = Some(0.0);
        lc.km_current = Some(0.0);
        lc.installed_at = None;
        if input.tread_depth_mm.is_some() {
            lc.tread_depth_mm = input.tread_depth_mm;
        }
        lc.notes = Some(append_note(tire.notes.as_deref(), Utc::now(), &text));
        Ok(lc)
    })
    .await?;

    tracing::info!(tire_id = id, user_id = user.user_id, "Tire returned from retreading");
    Ok(data(saved))
}

/// PUT /api/v1/tires/{id}/tread
pub async fn measure_tread(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<TreadRequest>,
) -> AppResult<impl IntoResponse> {
    let depth = require("tread_depth_mm", input.tread_depth_mm)?;
    validate_non_negative("tread_depth_mm", depth)?;
    let notes = optional_text(input.notes.as_deref());

    let saved = transition(&state, id, |tire| {
        let mut text = tread_note(tire.tread_depth_mm, depth);
        if let Some(n) = notes {
            text = format!("{text} - {n}");
        }
        let mut lc = TireLifecycle::from(tire);
        lc.tread_depth_mm = Some(depth);
        lc.notes = Some(append_note(tire.notes.as_deref(), Utc::now(), &text));
        Ok(lc)
    })
    .await?;
    Ok(data(saved))
}

// ---------------------------------------------------------------------------
// Reads and reports
// ---------------------------------------------------------------------------

/// GET /api/v1/tires/equipment/{equipment_id}
pub async fn by_equipment(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(equipment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tires = TireRepo::list_mounted(&state.pool, equipment_id).await?;
    let data: Vec<TireResponse> = tires.into_iter().map(TireResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/tires/report
pub async fn report(State(state): State<AppState>, _auth: AuthUser) -> AppResult<impl IntoResponse> {
    let by_status = TireRepo::count_by_status(&state.pool).await?;
    let by_brand = TireRepo::count_by_brand(&state.pool).await?;
    let stock_value = round2(TireRepo::stock_value(&state.pool).await?);
    let high_wear = TireRepo::list(&state.pool, &TireFilter::default())
        .await?
        .into_iter()
        .map(TireResponse::from)
        .filter(|t| t.life_used_percent.is_some_and(|p| p > HIGH_WEAR_PERCENT))
        .collect();
    Ok(Json(DataResponse {
        data: TireReport {
            by_status,
            by_brand,
            high_wear,
            stock_value,
        },
    }))
}

/// GET /api/v1/tires/performance-report
pub async fn performance_report(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let brands = TireRepo::brand_performance(&state.pool)
        .await?
        .into_iter()
        .map(BrandSummary::from)
        .collect();
    let top_by_km = TireRepo::top_by_km_run(&state.pool, TOP_BY_KM_LIMIT)
        .await?
        .into_iter()
        .map(TireResponse::from)
        .collect();
    Ok(Json(DataResponse {
        data: PerformanceReport { brands, top_by_km },
    }))
}

/// GET /api/v1/tires/alerts
pub async fn alerts(State(state): State<AppState>, _auth: AuthUser) -> AppResult<impl IntoResponse> {
    let mut alerts = Vec::new();
    for tire in TireRepo::list_not_discarded(&state.pool).await? {
        let life = tire.life_used_percent();
        for alert in wear_alerts(tire.tread_depth_mm, life) {
            alerts.push(TireAlert {
                tire_id: tire.id,
                serial_number: tire.serial_number.clone(),
                equipment_name: tire.equipment_name.clone(),
                position: tire.position.clone(),
                alert,
            });
        }
    }
    sort_by_severity(&mut alerts, |a| a.alert.severity);
    let total = alerts.len();
    Ok(Json(DataResponse {
        data: TireAlerts { alerts, total },
    }))
}
