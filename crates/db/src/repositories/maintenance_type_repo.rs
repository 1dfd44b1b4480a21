//! Repository for the `maintenance_types` table.

use cmms_core::types::DbId;
use sqlx::PgPool;

use crate::filter::{bind_values, Filter};
use crate::models::catalog::{
    CatalogFilter, CreateMaintenanceType, MaintenanceType, UpdateMaintenanceType,
};

const COLUMNS: &str = "id, name, code, description, color, is_active, created_at, updated_at";

pub struct MaintenanceTypeRepo;

impl MaintenanceTypeRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateMaintenanceType,
    ) -> Result<MaintenanceType, sqlx::Error> {
        let query = format!(
            "INSERT INTO maintenance_types (name, code, description, color, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MaintenanceType>(&query)
            .bind(&input.name)
            .bind(&input.code)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MaintenanceType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM maintenance_types WHERE id = $1");
        sqlx::query_as::<_, MaintenanceType>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &CatalogFilter,
    ) -> Result<Vec<MaintenanceType>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_bool("is_active", filter.is_active)
            .search(&["name", "code"], filter.search.as_deref());
        let query = format!(
            "SELECT {COLUMNS} FROM maintenance_types {} ORDER BY name",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, MaintenanceType>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMaintenanceType,
    ) -> Result<Option<MaintenanceType>, sqlx::Error> {
        let query = format!(
            "UPDATE maintenance_types SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                description = COALESCE($4, description),
                color = COALESCE($5, color),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MaintenanceType>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.code)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Number of work orders using this type.
    pub async fn usage_count(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM work_orders WHERE maintenance_type_id = $1",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM maintenance_types WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
