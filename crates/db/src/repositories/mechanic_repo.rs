//! Repository for the `mechanics` table.

use cmms_core::mechanic::PerformanceTotals;
use cmms_core::types::DbId;
use cmms_core::work_order::{STATUS_COMPLETED, STATUS_IN_PROGRESS};
use sqlx::{PgConnection, PgPool};

use crate::filter::{bind_values, Filter};
use crate::models::mechanic::{CreateMechanic, Mechanic, MechanicFilter, UpdateMechanic};

const COLUMNS: &str = "id, full_name, national_id, phone, email, specialty, experience_level, \
                        salary, hired_on, status, notes, created_at, updated_at";

pub struct MechanicRepo;

impl MechanicRepo {
    pub async fn create(pool: &PgPool, input: &CreateMechanic) -> Result<Mechanic, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::create_in(&mut conn, input).await
    }

    /// Insert on an open connection or transaction.
    pub async fn create_in(
        conn: &mut PgConnection,
        input: &CreateMechanic,
    ) -> Result<Mechanic, sqlx::Error> {
        let query = format!(
            "INSERT INTO mechanics
                (full_name, national_id, phone, email, specialty, experience_level,
                 salary, hired_on, status, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Mechanic>(&query)
            .bind(&input.full_name)
            .bind(&input.national_id)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.specialty)
            .bind(&input.experience_level)
            .bind(input.salary)
            .bind(input.hired_on)
            .bind(&input.status)
            .bind(&input.notes)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Mechanic>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mechanics WHERE id = $1");
        sqlx::query_as::<_, Mechanic>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The mechanic record linked to a user account by email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Mechanic>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mechanics WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, Mechanic>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List mechanics ordered by name.
    pub async fn list(pool: &PgPool, filter: &MechanicFilter) -> Result<Vec<Mechanic>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_text("status", filter.status.as_deref())
            .eq_text("specialty", filter.specialty.as_deref())
            .eq_text("experience_level", filter.experience_level.as_deref())
            .search(
                &["full_name", "national_id", "email", "specialty"],
                filter.search.as_deref(),
            );
        let query = format!(
            "SELECT {COLUMNS} FROM mechanics {} ORDER BY full_name",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, Mechanic>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMechanic,
    ) -> Result<Option<Mechanic>, sqlx::Error> {
        let query = format!(
            "UPDATE mechanics SET
                full_name = COALESCE($2, full_name),
                national_id = COALESCE($3, national_id),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                specialty = COALESCE($6, specialty),
                experience_level = COALESCE($7, experience_level),
                salary = COALESCE($8, salary),
                status = COALESCE($9, status),
                notes = COALESCE($10, notes),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Mechanic>(&query)
            .bind(id)
            .bind(&input.full_name)
            .bind(&input.national_id)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.specialty)
            .bind(&input.experience_level)
            .bind(input.salary)
            .bind(&input.status)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn work_order_count(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM work_orders WHERE mechanic_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM mechanics WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct non-empty specialties, sorted.
    pub async fn specialties(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT specialty FROM mechanics
             WHERE specialty IS NOT NULL AND specialty <> ''
             ORDER BY specialty",
        )
        .fetch_all(pool)
        .await
    }

    /// Work-order aggregates for one mechanic.
    pub async fn performance_totals(
        pool: &PgPool,
        id: DbId,
    ) -> Result<PerformanceTotals, sqlx::Error> {
        let row: (i64, i64, i64, f64, i64, f64) = sqlx::query_as(
            "SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = $2),
                COUNT(*) FILTER (WHERE status = $3),
                COALESCE(SUM(execution_hours) FILTER (WHERE status = $2), 0),
                COUNT(execution_hours) FILTER (WHERE status = $2),
                COALESCE(SUM(total_cost) FILTER (WHERE status = $2), 0)
             FROM work_orders WHERE mechanic_id = $1",
        )
        .bind(id)
        .bind(STATUS_COMPLETED)
        .bind(STATUS_IN_PROGRESS)
        .fetch_one(pool)
        .await?;

        Ok(PerformanceTotals {
            total: row.0,
            completed: row.1,
            in_progress: row.2,
            execution_hours_sum: row.3,
            execution_hours_count: row.4,
            total_cost: row.5,
        })
    }
}
