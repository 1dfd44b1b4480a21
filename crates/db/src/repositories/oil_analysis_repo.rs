//! Repository for the `oil_analyses` table.

use cmms_core::oil_analysis::STATUS_COMPLETED;
use cmms_core::types::DbId;
use sqlx::PgPool;

use crate::filter::{bind_values, Filter};
use crate::models::dashboard::LabelCount;
use crate::models::oil_analysis::{
    CompleteOilAnalysis, CreateOilAnalysis, OilAnalysis, OilAnalysisFilter, UpdateOilAnalysis,
};

/// Columns selected from `oil_analyses o` joined with its equipment.
const COLUMNS: &str = "o.id, o.equipment_id, e.name AS equipment_name, \
                        e.internal_code AS equipment_code, o.sample_number, o.collected_at, \
                        o.hour_meter_at_collection, o.oil_type, o.laboratory, o.lab_result_at, \
                        o.parameters, o.diagnosis, o.recommended_action, o.executed_action, \
                        o.status, o.priority, o.collected_by, o.analyzed_by, o.notes, \
                        o.created_at, o.updated_at";

const JOINS: &str = "LEFT JOIN equipment e ON e.id = o.equipment_id";

pub struct OilAnalysisRepo;

impl OilAnalysisRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateOilAnalysis,
    ) -> Result<OilAnalysis, sqlx::Error> {
        let query = format!(
            "WITH o AS (
                INSERT INTO oil_analyses
                    (equipment_id, sample_number, collected_at, hour_meter_at_collection,
                     oil_type, laboratory, parameters, status, priority, collected_by, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING *
             )
             SELECT {COLUMNS} FROM o {JOINS}"
        );
        sqlx::query_as::<_, OilAnalysis>(&query)
            .bind(input.equipment_id)
            .bind(&input.sample_number)
            .bind(input.collected_at)
            .bind(input.hour_meter_at_collection)
            .bind(&input.oil_type)
            .bind(&input.laboratory)
            .bind(&input.parameters)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(&input.collected_by)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OilAnalysis>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM oil_analyses o {JOINS} WHERE o.id = $1");
        sqlx::query_as::<_, OilAnalysis>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List analyses, most recently collected first.
    pub async fn list(
        pool: &PgPool,
        filter: &OilAnalysisFilter,
    ) -> Result<Vec<OilAnalysis>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_text("o.status", filter.status.as_deref())
            .eq_text("o.priority", filter.priority.as_deref())
            .eq_id("o.equipment_id", filter.equipment_id)
            .search(
                &["o.sample_number", "o.oil_type", "o.laboratory"],
                filter.search.as_deref(),
            );
        let query = format!(
            "SELECT {COLUMNS} FROM oil_analyses o {JOINS} {} ORDER BY o.collected_at DESC, o.id DESC",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, OilAnalysis>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateOilAnalysis,
    ) -> Result<Option<OilAnalysis>, sqlx::Error> {
        let query = format!(
            "WITH o AS (
                UPDATE oil_analyses SET
                    hour_meter_at_collection = COALESCE($2, hour_meter_at_collection),
                    oil_type = COALESCE($3, oil_type),
                    laboratory = COALESCE($4, laboratory),
                    lab_result_at = COALESCE($5, lab_result_at),
                    parameters = COALESCE($6, parameters),
                    diagnosis = COALESCE($7, diagnosis),
                    recommended_action = COALESCE($8, recommended_action),
                    executed_action = COALESCE($9, executed_action),
                    status = COALESCE($10, status),
                    priority = COALESCE($11, priority),
                    notes = COALESCE($12, notes),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM o {JOINS}"
        );
        sqlx::query_as::<_, OilAnalysis>(&query)
            .bind(id)
            .bind(input.hour_meter_at_collection)
            .bind(&input.oil_type)
            .bind(&input.laboratory)
            .bind(input.lab_result_at)
            .bind(&input.parameters)
            .bind(&input.diagnosis)
            .bind(&input.recommended_action)
            .bind(&input.executed_action)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Record the laboratory result and mark the analysis completed.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        input: &CompleteOilAnalysis,
    ) -> Result<Option<OilAnalysis>, sqlx::Error> {
        let query = format!(
            "WITH o AS (
                UPDATE oil_analyses SET
                    status = $2,
                    diagnosis = $3,
                    recommended_action = COALESCE($4, recommended_action),
                    executed_action = COALESCE($5, executed_action),
                    parameters = COALESCE($6, parameters),
                    lab_result_at = $7,
                    analyzed_by = $8,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM o {JOINS}"
        );
        sqlx::query_as::<_, OilAnalysis>(&query)
            .bind(id)
            .bind(STATUS_COMPLETED)
            .bind(&input.diagnosis)
            .bind(&input.recommended_action)
            .bind(&input.executed_action)
            .bind(&input.parameters)
            .bind(input.lab_result_at)
            .bind(&input.analyzed_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn sample_taken(pool: &PgPool, sample_number: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM oil_analyses WHERE sample_number = $1)",
        )
        .bind(sample_number)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM oil_analyses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<LabelCount>, sqlx::Error> {
        sqlx::query_as::<_, LabelCount>(
            "SELECT status AS label, COUNT(*) AS count FROM oil_analyses
             GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_priority(pool: &PgPool) -> Result<Vec<LabelCount>, sqlx::Error> {
        sqlx::query_as::<_, LabelCount>(
            "SELECT priority AS label, COUNT(*) AS count FROM oil_analyses
             GROUP BY priority ORDER BY priority",
        )
        .fetch_all(pool)
        .await
    }

    /// Equipment with the most analyses.
    pub async fn top_equipment(pool: &PgPool, limit: i64) -> Result<Vec<LabelCount>, sqlx::Error> {
        sqlx::query_as::<_, LabelCount>(
            "SELECT e.name AS label, COUNT(*) AS count
             FROM oil_analyses o JOIN equipment e ON e.id = o.equipment_id
             GROUP BY e.id, e.name
             ORDER BY COUNT(*) DESC, e.name
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
