//! Repository for the `backlog_items` table.

use cmms_core::backlog::{CLOSED_STATUSES, LEVEL_CRITICAL, LEVEL_HIGH, PENDING_STATUSES};
use cmms_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::filter::{bind_values, bind_values_scalar, BindValue, Filter};
use crate::models::backlog::{
    BacklogDerived, BacklogFilter, BacklogItem, BacklogTotals, CreateBacklogItem,
    UpdateBacklogItem,
};
use crate::models::dashboard::LabelCount;

/// Columns selected from `backlog_items b` joined with its display names.
const COLUMNS: &str = "b.id, b.title, b.description, b.category, b.item_type, b.priority, \
                        b.urgency, b.impact, b.equipment_id, e.name AS equipment_name, \
                        b.work_order_id, w.number AS work_order_number, b.preventive_plan_id, \
                        b.estimated_effort_hours, b.estimated_cost, b.identified_at, b.due_at, \
                        b.started_at, b.completed_at, b.status, b.responsible, b.notes, \
                        b.priority_score, b.created_by, u.full_name AS created_by_name, \
                        b.created_at, b.updated_at";

const JOINS: &str = "LEFT JOIN equipment e ON e.id = b.equipment_id \
                     LEFT JOIN work_orders w ON w.id = b.work_order_id \
                     LEFT JOIN users u ON u.id = b.created_by";

/// Validated ordering for a listing.
#[derive(Debug, Clone, Copy)]
pub struct BacklogOrder {
    pub column: &'static str,
    pub direction: &'static str,
    pub limit: i64,
    pub offset: i64,
}

/// Dimension for the statistics breakdowns.
#[derive(Debug, Clone, Copy)]
pub enum BacklogGrouping {
    Status,
    Category,
    Priority,
}

impl BacklogGrouping {
    fn column(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Category => "category",
            Self::Priority => "priority",
        }
    }
}

pub struct BacklogRepo;

impl BacklogRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateBacklogItem,
    ) -> Result<BacklogItem, sqlx::Error> {
        let query = format!(
            "WITH b AS (
                INSERT INTO backlog_items
                    (title, description, category, item_type, priority, urgency, impact,
                     equipment_id, work_order_id, preventive_plan_id, estimated_effort_hours,
                     estimated_cost, identified_at, due_at, responsible, notes, priority_score,
                     created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                        $17, $18)
                RETURNING *
             )
             SELECT {COLUMNS} FROM b {JOINS}"
        );
        sqlx::query_as::<_, BacklogItem>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.item_type)
            .bind(&input.priority)
            .bind(&input.urgency)
            .bind(&input.impact)
            .bind(input.equipment_id)
            .bind(input.work_order_id)
            .bind(input.preventive_plan_id)
            .bind(input.estimated_effort_hours)
            .bind(input.estimated_cost)
            .bind(input.identified_at)
            .bind(input.due_at)
            .bind(&input.responsible)
            .bind(&input.notes)
            .bind(input.priority_score)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BacklogItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM backlog_items b {JOINS} WHERE b.id = $1");
        sqlx::query_as::<_, BacklogItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    fn filter_for(filter: &BacklogFilter) -> Filter {
        let mut f = Filter::new();
        f.eq_text("b.category", filter.category.as_deref())
            .eq_text("b.status", filter.status.as_deref())
            .eq_text("b.priority", filter.priority.as_deref())
            .eq_id("b.equipment_id", filter.equipment_id)
            .search(&["b.responsible"], filter.responsible.as_deref())
            .search(
                &["b.title", "b.description", "b.notes"],
                filter.search.as_deref(),
            );
        f
    }

    /// One page of items and the total number of matches.
    pub async fn list(
        pool: &PgPool,
        filter: &BacklogFilter,
        order: BacklogOrder,
    ) -> Result<(Vec<BacklogItem>, i64), sqlx::Error> {
        let f = Self::filter_for(filter);
        let where_clause = f.where_clause();

        let count_query = format!(
            "SELECT COUNT(*) FROM backlog_items b {JOINS} {where_clause}"
        );
        let total = bind_values_scalar(sqlx::query_scalar::<_, i64>(&count_query), f.values())
            .fetch_one(pool)
            .await?;

        let next = f.next_index();
        let query = format!(
            "SELECT {COLUMNS} FROM backlog_items b {JOINS} {where_clause}
             ORDER BY b.{} {} NULLS LAST, b.id DESC
             LIMIT ${} OFFSET ${}",
            order.column,
            order.direction,
            next,
            next + 1
        );
        let items = bind_values(sqlx::query_as::<_, BacklogItem>(&query), f.values())
            .bind(order.limit)
            .bind(order.offset)
            .fetch_all(pool)
            .await?;

        Ok((items, total))
    }

    /// Update an item. `derived` carries the timestamps and score the caller
    /// computed for this change.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBacklogItem,
        derived: &BacklogDerived,
    ) -> Result<Option<BacklogItem>, sqlx::Error> {
        let query = format!(
            "WITH b AS (
                UPDATE backlog_items SET
                    title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    category = COALESCE($4, category),
                    item_type = COALESCE($5, item_type),
                    priority = COALESCE($6, priority),
                    urgency = COALESCE($7, urgency),
                    impact = COALESCE($8, impact),
                    equipment_id = COALESCE($9, equipment_id),
                    work_order_id = COALESCE($10, work_order_id),
                    preventive_plan_id = COALESCE($11, preventive_plan_id),
                    estimated_effort_hours = COALESCE($12, estimated_effort_hours),
                    estimated_cost = COALESCE($13, estimated_cost),
                    due_at = COALESCE($14, due_at),
                    status = COALESCE($15, status),
                    responsible = COALESCE($16, responsible),
                    notes = COALESCE($17, notes),
                    started_at = COALESCE($18, started_at),
                    completed_at = COALESCE($19, completed_at),
                    priority_score = COALESCE($20, priority_score),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM b {JOINS}"
        );
        sqlx::query_as::<_, BacklogItem>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.item_type)
            .bind(&input.priority)
            .bind(&input.urgency)
            .bind(&input.impact)
            .bind(input.equipment_id)
            .bind(input.work_order_id)
            .bind(input.preventive_plan_id)
            .bind(input.estimated_effort_hours)
            .bind(input.estimated_cost)
            .bind(input.due_at)
            .bind(&input.status)
            .bind(&input.responsible)
            .bind(&input.notes)
            .bind(derived.started_at)
            .bind(derived.completed_at)
            .bind(derived.priority_score)
            .fetch_optional(pool)
            .await
    }

    /// Change the status, stamping `started_at` or `completed_at` and
    /// replacing the notes when given.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        status: &str,
        started_at: Option<Timestamp>,
        completed_at: Option<Timestamp>,
        notes: Option<&str>,
    ) -> Result<Option<BacklogItem>, sqlx::Error> {
        let query = format!(
            "WITH b AS (
                UPDATE backlog_items SET
                    status = $2,
                    started_at = COALESCE($3, started_at),
                    completed_at = COALESCE($4, completed_at),
                    notes = COALESCE($5, notes),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM b {JOINS}"
        );
        sqlx::query_as::<_, BacklogItem>(&query)
            .bind(id)
            .bind(status)
            .bind(started_at)
            .bind(completed_at)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM backlog_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Prioritisation
    // -----------------------------------------------------------------------

    /// Items not yet completed or cancelled.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<BacklogItem>, sqlx::Error> {
        let mut f = Filter::new();
        for status in CLOSED_STATUSES {
            f.push("b.status <> {}", BindValue::Text(status.to_string()));
        }
        let query = format!(
            "SELECT {COLUMNS} FROM backlog_items b {JOINS} {}",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, BacklogItem>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    /// Store recomputed scores in one transaction. Returns the number of rows.
    pub async fn save_scores(pool: &PgPool, scores: &[(DbId, f64)]) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut updated = 0;
        for (id, score) in scores {
            let result = sqlx::query(
                "UPDATE backlog_items SET priority_score = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(score)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }
        tx.commit().await?;
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Item counts grouped by status, category or priority.
    pub async fn count_by(
        pool: &PgPool,
        grouping: BacklogGrouping,
    ) -> Result<Vec<LabelCount>, sqlx::Error> {
        let column = grouping.column();
        let query = format!(
            "SELECT {column} AS label, COUNT(*) AS count FROM backlog_items
             GROUP BY {column} ORDER BY {column}"
        );
        sqlx::query_as::<_, LabelCount>(&query).fetch_all(pool).await
    }

    pub async fn totals(pool: &PgPool, now: Timestamp) -> Result<BacklogTotals, sqlx::Error> {
        let pending: Vec<String> = PENDING_STATUSES.iter().map(|s| s.to_string()).collect();
        let closed: Vec<String> = CLOSED_STATUSES.iter().map(|s| s.to_string()).collect();
        let urgent: Vec<String> = [LEVEL_HIGH, LEVEL_CRITICAL]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let row: (i64, i64, i64, f64, f64) = sqlx::query_as(
            "SELECT
                COUNT(*),
                COUNT(*) FILTER (
                    WHERE priority = ANY($1) AND urgency = ANY($1) AND status = ANY($2)
                ),
                COUNT(*) FILTER (WHERE due_at < $4 AND NOT (status = ANY($3))),
                COALESCE(SUM(estimated_effort_hours) FILTER (WHERE NOT (status = ANY($3))), 0),
                COALESCE(SUM(estimated_cost) FILTER (WHERE NOT (status = ANY($3))), 0)
             FROM backlog_items",
        )
        .bind(&urgent)
        .bind(&pending)
        .bind(&closed)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(BacklogTotals {
            total: row.0,
            critical: row.1,
            overdue: row.2,
            open_effort_hours: row.3,
            open_cost: row.4,
        })
    }
}
