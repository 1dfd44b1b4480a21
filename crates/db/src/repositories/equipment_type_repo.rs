//! Repository for the `equipment_types` table.

use cmms_core::types::DbId;
use sqlx::PgPool;

use crate::filter::{bind_values, Filter};
use crate::models::catalog::{
    CatalogFilter, CreateEquipmentType, EquipmentType, UpdateEquipmentType,
};

const COLUMNS: &str = "id, name, description, is_active, created_at, updated_at";

pub struct EquipmentTypeRepo;

impl EquipmentTypeRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateEquipmentType,
    ) -> Result<EquipmentType, sqlx::Error> {
        let query = format!(
            "INSERT INTO equipment_types (name, description, is_active)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EquipmentType>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<EquipmentType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment_types WHERE id = $1");
        sqlx::query_as::<_, EquipmentType>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &CatalogFilter,
    ) -> Result<Vec<EquipmentType>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_bool("is_active", filter.is_active)
            .search(&["name", "description"], filter.search.as_deref());
        let query = format!(
            "SELECT {COLUMNS} FROM equipment_types {} ORDER BY name",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, EquipmentType>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEquipmentType,
    ) -> Result<Option<EquipmentType>, sqlx::Error> {
        let query = format!(
            "UPDATE equipment_types SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EquipmentType>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Number of equipment rows using this type.
    pub async fn usage_count(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM equipment WHERE equipment_type_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM equipment_types WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
