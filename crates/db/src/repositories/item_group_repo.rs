//! Repository for the `item_groups` table.

use cmms_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::filter::{bind_values, Filter};
use crate::models::catalog::{CatalogFilter, CreateItemGroup, ItemGroup, UpdateItemGroup};

const COLUMNS: &str = "id, name, code, description, is_active, created_at, updated_at";

pub struct ItemGroupRepo;

impl ItemGroupRepo {
    pub async fn create(pool: &PgPool, input: &CreateItemGroup) -> Result<ItemGroup, sqlx::Error> {
        let query = format!(
            "INSERT INTO item_groups (name, code, description, is_active)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ItemGroup>(&query)
            .bind(&input.name)
            .bind(&input.code)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ItemGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM item_groups WHERE id = $1");
        sqlx::query_as::<_, ItemGroup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &CatalogFilter,
    ) -> Result<Vec<ItemGroup>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_bool("is_active", filter.is_active)
            .search(&["name", "code"], filter.search.as_deref());
        let query = format!(
            "SELECT {COLUMNS} FROM item_groups {} ORDER BY name",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, ItemGroup>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateItemGroup,
    ) -> Result<Option<ItemGroup>, sqlx::Error> {
        let query = format!(
            "UPDATE item_groups SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ItemGroup>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.code)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Number of parts filed under this group.
    pub async fn usage_count(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM parts WHERE item_group_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM item_groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a group by name or create it, inside an open transaction.
    ///
    /// Used by the spreadsheet import, where groups are created on demand.
    /// Returns the group id and whether it was created.
    pub async fn find_or_create_in(
        conn: &mut PgConnection,
        name: &str,
        code: &str,
    ) -> Result<(DbId, bool), sqlx::Error> {
        let existing = sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM item_groups WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
        if let Some(id) = existing {
            return Ok((id, false));
        }

        let inserted = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO item_groups (name, code, description)
             VALUES ($1, $2, 'Created by spreadsheet import')
             ON CONFLICT (code) DO NOTHING
             RETURNING id",
        )
        .bind(name)
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;
        if let Some(id) = inserted {
            return Ok((id, true));
        }

        // Another group already owns the derived code; file the part there.
        let id = sqlx::query_scalar::<_, DbId>("SELECT id FROM item_groups WHERE code = $1")
            .bind(code)
            .fetch_one(&mut *conn)
            .await?;
        Ok((id, false))
    }
}
