//! Handlers for the `/backlog` resource: the maintenance backlog with its
//! prioritisation score, paginated listing and statistics.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use cmms_core::backlog::{
    check_can_complete, check_can_start, completion_notes, priority_score, sort_column,
    sort_direction, validate_category, validate_level, validate_status, PageInfo, ScoreInput,
    DEFAULT_LEVEL, STATUS_COMPLETED, STATUS_IN_PROGRESS,
};
use cmms_core::types::{DbId, Timestamp};
use cmms_core::validation::{optional_text, require_text, validate_non_negative};
use cmms_db::models::backlog::{
    BacklogDerived, BacklogFilter, BacklogItem, BacklogItemResponse, BacklogTotals,
    CreateBacklogItem, UpdateBacklogItem,
};
use cmms_db::models::dashboard::LabelCount;
use cmms_db::repositories::{
    BacklogGrouping, BacklogOrder, BacklogRepo, EquipmentRepo, WorkOrderRepo,
};
use serde::{Deserialize, Serialize};

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBacklogRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub item_type: Option<String>,
    pub priority: Option<String>,
    pub urgency: Option<String>,
    pub impact: Option<String>,
    pub equipment_id: Option<DbId>,
    pub work_order_id: Option<DbId>,
    pub preventive_plan_id: Option<DbId>,
    pub estimated_effort_hours: Option<f64>,
    pub estimated_cost: Option<f64>,
    pub identified_at: Option<Timestamp>,
    pub due_at: Option<Timestamp>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteBacklogRequest {
    pub completion_notes: Option<String>,
}

/// One page of backlog items with its pagination metadata.
#[derive(Debug, Serialize)]
pub struct BacklogPage {
    pub data: Vec<BacklogItemResponse>,
    #[serde(flatten)]
    pub page: PageInfo,
}

#[derive(Debug, Serialize)]
pub struct BacklogStats {
    #[serde(flatten)]
    pub totals: BacklogTotals,
    pub by_status: Vec<LabelCount>,
    pub by_category: Vec<LabelCount>,
    pub by_priority: Vec<LabelCount>,
}

#[derive(Debug, Serialize)]
pub struct Prioritized {
    pub updated: u64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load(state: &AppState, id: DbId) -> AppResult<BacklogItem> {
    BacklogRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("BacklogItem", id))
}

async fn ensure_links(
    state: &AppState,
    equipment_id: Option<DbId>,
    work_order_id: Option<DbId>,
) -> AppResult<()> {
    if let Some(eid) = equipment_id {
        if EquipmentRepo::find_by_id(&state.pool, eid).await?.is_none() {
            return Err(not_found("Equipment", eid));
        }
    }
    if let Some(wid) = work_order_id {
        if WorkOrderRepo::find_by_id(&state.pool, wid).await?.is_none() {
            return Err(not_found("WorkOrder", wid));
        }
    }
    Ok(())
}

fn level_or_default(field: &str, value: Option<&str>) -> AppResult<String> {
    let level = optional_text(value).unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    validate_level(field, &level)?;
    Ok(level)
}

/// Timestamps and score to write for an update of `current`.
fn derive_update(
    current: &BacklogItem,
    input: &UpdateBacklogItem,
    now: Timestamp,
) -> BacklogDerived {
    let mut derived = BacklogDerived::default();
    match input.status.as_deref() {
        Some(s) if s == current.status => {}
        Some(STATUS_IN_PROGRESS) => derived.started_at = Some(now),
        Some(STATUS_COMPLETED) => derived.completed_at = Some(now),
        _ => {}
    }

    let rescore = input.priority.is_some()
        || input.urgency.is_some()
        || input.impact.is_some()
        || input.category.is_some();
    if rescore {
        let score = ScoreInput {
            priority: input.priority.as_deref().unwrap_or(&current.priority),
            urgency: input.urgency.as_deref().unwrap_or(&current.urgency),
            impact: input.impact.as_deref().unwrap_or(&current.impact),
            category: input.category.as_deref().unwrap_or(&current.category),
            identified_at: current.identified_at,
        };
        derived.priority_score = Some(priority_score(&score, now));
    }
    derived
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/backlog
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<BacklogFilter>,
) -> AppResult<impl IntoResponse> {
    let column = sort_column(filter.sort_by.as_deref())?;
    let direction = sort_direction(filter.sort_order.as_deref())?;
    let (page, per_page) = PageInfo::clamp(filter.page, filter.per_page);
    let order = BacklogOrder {
        column,
        direction,
        limit: per_page,
        offset: PageInfo::offset(page, per_page),
    };

    let (items, total) = BacklogRepo::list(&state.pool, &filter, order).await?;
    let now = Utc::now();
    Ok(Json(BacklogPage {
        data: items
            .into_iter()
            .map(|item| BacklogItemResponse::new(item, now))
            .collect(),
        page: PageInfo::new(total, page, per_page),
    }))
}

/// POST /api/v1/backlog
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateBacklogRequest>,
) -> AppResult<impl IntoResponse> {
    let title = require_text("title", input.title.as_deref())?;
    let category = require_text("category", input.category.as_deref())?;
    let item_type = require_text("item_type", input.item_type.as_deref())?;
    validate_category(&category)?;
    let priority = level_or_default("priority", input.priority.as_deref())?;
    let urgency = level_or_default("urgency", input.urgency.as_deref())?;
    let impact = level_or_default("impact", input.impact.as_deref())?;
    for (field, value) in [
        ("estimated_effort_hours", input.estimated_effort_hours),
        ("estimated_cost", input.estimated_cost),
    ] {
        if let Some(v) = value {
            validate_non_negative(field, v)?;
        }
    }
    ensure_links(&state, input.equipment_id, input.work_order_id).await?;

    let now = Utc::now();
    let identified_at = input.identified_at.unwrap_or(now);
    let score = priority_score(
        &ScoreInput {
            priority: &priority,
            urgency: &urgency,
            impact: &impact,
            category: &category,
            identified_at,
        },
        now,
    );

    let item = BacklogRepo::create(
        &state.pool,
        &CreateBacklogItem {
            title,
            description: optional_text(input.description.as_deref()),
            category,
            item_type,
            priority,
            urgency,
            impact,
            equipment_id: input.equipment_id,
            work_order_id: input.work_order_id,
            preventive_plan_id: input.preventive_plan_id,
            estimated_effort_hours: input.estimated_effort_hours,
            estimated_cost: input.estimated_cost,
            identified_at,
            due_at: input.due_at,
            responsible: optional_text(input.responsible.as_deref()),
            notes: optional_text(input.notes.as_deref()),
            priority_score: score,
            created_by: Some(auth.user_id),
        },
    )
    .await?;

    tracing::info!(
        backlog_id = item.id,
        score = item.priority_score,
        user_id = auth.user_id,
        "Backlog item created",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BacklogItemResponse::new(item, now),
        }),
    ))
}

/// GET /api/v1/backlog/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let item = load(&state, id).await?;
    Ok(Json(DataResponse {
        data: BacklogItemResponse::new(item, Utc::now()),
    }))
}

/// PUT /api/v1/backlog/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBacklogItem>,
) -> AppResult<impl IntoResponse> {
    if let Some(category) = input.category.as_deref() {
        validate_category(category)?;
    }
    if let Some(status) = input.status.as_deref() {
        validate_status(status)?;
    }
    for (field, value) in [
        ("priority", &input.priority),
        ("urgency", &input.urgency),
        ("impact", &input.impact),
    ] {
        if let Some(level) = value.as_deref() {
            validate_level(field, level)?;
        }
    }
    ensure_links(&state, input.equipment_id, input.work_order_id).await?;

    let current = load(&state, id).await?;
    let now = Utc::now();
    let derived = derive_update(&current, &input, now);
    let item = BacklogRepo::update(&state.pool, id, &input, &derived)
        .await?
        .ok_or_else(|| not_found("BacklogItem", id))?;

    if item.status != current.status {
        tracing::info!(
            backlog_id = id,
            from = %current.status,
            to = %item.status,
            user_id = auth.user_id,
            "Backlog item status changed",
        );
    }
    Ok(Json(DataResponse {
        data: BacklogItemResponse::new(item, now),
    }))
}

/// DELETE /api/v1/backlog/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !BacklogRepo::delete(&state.pool, id).await? {
        return Err(not_found("BacklogItem", id));
    }
    tracing::info!(backlog_id = id, user_id = user.user_id, "Backlog item deleted");
    Ok(Json(MessageResponse::new("Backlog item deleted")))
}

/// GET /api/v1/backlog/stats
pub async fn stats(State(state): State<AppState>, _auth: AuthUser) -> AppResult<impl IntoResponse> {
    let totals = BacklogRepo::totals(&state.pool, Utc::now()).await?;
    let by_status = BacklogRepo::count_by(&state.pool, BacklogGrouping::Status).await?;
    let by_category = BacklogRepo::count_by(&state.pool, BacklogGrouping::Category).await?;
    let by_priority = BacklogRepo::count_by(&state.pool, BacklogGrouping::Priority).await?;
    Ok(Json(DataResponse {
        data: BacklogStats {
            totals,
            by_status,
            by_category,
            by_priority,
        },
    }))
}

/// POST /api/v1/backlog/prioritize
pub async fn prioritize(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let scores: Vec<(DbId, f64)> = BacklogRepo::list_open(&state.pool)
        .await?
        .iter()
        .map(|item| (item.id, priority_score(&item.score_input(), now)))
        .collect();
    let updated = BacklogRepo::save_scores(&state.pool, &scores).await?;
    tracing::info!(updated, user_id = user.user_id, "Backlog scores recomputed");
    Ok(Json(DataResponse {
        data: Prioritized { updated },
    }))
}

/// POST /api/v1/backlog/{id}/start
pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let item = load(&state, id).await?;
    check_can_start(&item.status)?;
    let now = Utc::now();
    let item = BacklogRepo::transition(&state.pool, id, STATUS_IN_PROGRESS, Some(now), None, None)
        .await?
        .ok_or_else(|| not_found("BacklogItem", id))?;
    tracing::info!(backlog_id = id, user_id = auth.user_id, "Backlog item started");
    Ok(Json(DataResponse {
        data: BacklogItemResponse::new(item, now),
    }))
}

/// POST /api/v1/backlog/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    input: Option<Json<CompleteBacklogRequest>>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = input.unwrap_or_default();
    let item = load(&state, id).await?;
    check_can_complete(&item.status)?;
    let notes = completion_notes(item.notes.as_deref(), input.completion_notes.as_deref());
    let now = Utc::now();
    let item = BacklogRepo::transition(
        &state.pool,
        id,
        STATUS_COMPLETED,
        None,
        Some(now),
        notes.as_deref(),
    )
    .await?
    .ok_or_else(|| not_found("BacklogItem", id))?;
    tracing::info!(backlog_id = id, user_id = auth.user_id, "Backlog item completed");
    Ok(Json(DataResponse {
        data: BacklogItemResponse::new(item, now),
    }))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use cmms_core::backlog::{
        CATEGORY_EMERGENCY, CATEGORY_IMPROVEMENT, STATUS_APPROVED, STATUS_IDENTIFIED,
    };

    use super::*;

    fn item(status: &str) -> BacklogItem {
        let now = Utc::now();
        BacklogItem {
            id: 1,
            title: "Replace conveyor belt".into(),
            description: None,
            category: CATEGORY_IMPROVEMENT.into(),
            item_type: "mechanical".into(),
            priority: "medium".into(),
            urgency: "medium".into(),
            impact: "medium".into(),
            equipment_id: None,
            equipment_name: None,
            work_order_id: None,
            work_order_number: None,
            preventive_plan_id: None,
            estimated_effort_hours: None,
            estimated_cost: None,
            identified_at: now - Duration::days(2),
            due_at: None,
            started_at: None,
            completed_at: None,
            status: status.into(),
            responsible: None,
            notes: None,
            priority_score: 6.0,
            created_by: None,
            created_by_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn moving_to_in_progress_stamps_start() {
        let input = UpdateBacklogItem {
            status: Some(STATUS_IN_PROGRESS.into()),
            ..Default::default()
        };
        let derived = derive_update(&item(STATUS_APPROVED), &input, Utc::now());
        assert!(derived.started_at.is_some());
        assert!(derived.completed_at.is_none());
        assert!(derived.priority_score.is_none());
    }

    #[test]
    fn same_status_stamps_nothing() {
        let input = UpdateBacklogItem {
            status: Some(STATUS_IDENTIFIED.into()),
            ..Default::default()
        };
        let derived = derive_update(&item(STATUS_IDENTIFIED), &input, Utc::now());
        assert!(derived.started_at.is_none());
    }

    #[test]
    fn category_change_rescores() {
        let input = UpdateBacklogItem {
            category: Some(CATEGORY_EMERGENCY.into()),
            ..Default::default()
        };
        let derived = derive_update(&item(STATUS_IDENTIFIED), &input, Utc::now());
        // medium x medium + medium + emergency bonus
        assert_eq!(derived.priority_score, Some(11.0));
    }
}
