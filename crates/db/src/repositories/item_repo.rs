//! Repository for the `items` catalog table.

use cmms_core::types::DbId;
use sqlx::PgPool;

use crate::filter::{bind_values, Filter};
use crate::models::catalog::{CatalogFilter, CreateItem, Item, UpdateItem};

const COLUMNS: &str = "id, code, name, description, unit_of_measure, group_name, manufacturer, \
                        created_at, updated_at";

pub struct ItemRepo;

impl ItemRepo {
    pub async fn create(pool: &PgPool, input: &CreateItem) -> Result<Item, sqlx::Error> {
        let query = format!(
            "INSERT INTO items (code, name, description, unit_of_measure, group_name, manufacturer)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.unit_of_measure)
            .bind(&input.group_name)
            .bind(&input.manufacturer)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Item>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items WHERE id = $1");
        sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List items ordered by name. Items carry no active flag, so only the
    /// search term applies.
    pub async fn list(pool: &PgPool, filter: &CatalogFilter) -> Result<Vec<Item>, sqlx::Error> {
        let mut f = Filter::new();
        f.search(&["code", "name", "group_name"], filter.search.as_deref());
        let query = format!("SELECT {COLUMNS} FROM items {} ORDER BY name", f.where_clause());
        bind_values(sqlx::query_as::<_, Item>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateItem,
    ) -> Result<Option<Item>, sqlx::Error> {
        let query = format!(
            "UPDATE items SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                unit_of_measure = COALESCE($5, unit_of_measure),
                group_name = COALESCE($6, group_name),
                manufacturer = COALESCE($7, manufacturer),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.unit_of_measure)
            .bind(&input.group_name)
            .bind(&input.manufacturer)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
