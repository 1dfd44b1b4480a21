//! Handler for `GET /dashboard`: headline KPIs and chart series.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use cmms_core::dashboard::{monthly_cost_since, trend_windows};
use cmms_core::work_order::{VALID_STATUSES, VALID_TYPES};
use cmms_db::models::dashboard::{DashboardKpis, LabelCount};
use cmms_db::repositories::DashboardRepo;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const TOP_EQUIPMENT_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
pub struct DashboardCharts {
    pub work_order_trend: Vec<LabelCount>,
    pub work_orders_by_status: IndexMap<&'static str, i64>,
    pub top_equipment: Vec<LabelCount>,
    pub work_orders_by_type: IndexMap<&'static str, i64>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub kpis: DashboardKpis,
    pub charts: DashboardCharts,
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Dashboard>>> {
    let now = Utc::now();
    let kpis = DashboardRepo::kpis(&state.pool, monthly_cost_since(now)).await?;
    let trend = DashboardRepo::work_order_trend(&state.pool, &trend_windows(now)).await?;
    let by_status = DashboardRepo::work_orders_by_status(&state.pool).await?;
    let by_type = DashboardRepo::work_orders_by_type(&state.pool).await?;
    let top_equipment = DashboardRepo::top_equipment(&state.pool, TOP_EQUIPMENT_LIMIT).await?;

    Ok(Json(DataResponse {
        data: Dashboard {
            kpis,
            charts: DashboardCharts {
                work_order_trend: trend,
                work_orders_by_status: fill_series(VALID_STATUSES, &by_status),
                top_equipment,
                work_orders_by_type: fill_series(VALID_TYPES, &by_type),
            },
        },
    }))
}

/// Counts keyed by every known label, zero where the database had no rows.
fn fill_series(labels: &[&'static str], counts: &[LabelCount]) -> IndexMap<&'static str, i64> {
    labels
        .iter()
        .map(|label| {
            let count = counts
                .iter()
                .find(|c| c.label == *label)
                .map_or(0, |c| c.count);
            (*label, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_labels_are_zero_filled_in_order() {
        let counts = vec![LabelCount {
            label: "completed".to_string(),
            count: 4,
        }];
        let series = fill_series(VALID_STATUSES, &counts);
        assert_eq!(series.len(), VALID_STATUSES.len());
        assert_eq!(series["completed"], 4);
        assert_eq!(series["open"], 0);
        assert_eq!(series.keys().next(), Some(&"open"));
    }
}
