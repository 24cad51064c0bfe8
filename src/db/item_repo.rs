// src/db/item_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::item::{Item, ItemPayload},
};

const ITEM_COLUMNS: &str = "id, vendor_id, name, price, length, width, height, material_id, scene_id, \
                            style_id, paint_id, decoration_id, carve_type_id, stove_id, sand_grade_id, \
                            is_suite, is_component, suite_id, is_deleted, created_at";

#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the item row only; join rows are written separately.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        vendor_id: i32,
        payload: &ItemPayload,
        suite_id: Option<i32>,
    ) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let is_component = suite_id.is_some();
        let sql = format!(
            "INSERT INTO items (vendor_id, name, price, length, width, height, material_id, scene_id, \
                                style_id, paint_id, decoration_id, carve_type_id, stove_id, sand_grade_id, \
                                is_suite, is_component, suite_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {ITEM_COLUMNS}"
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(vendor_id)
            .bind(&payload.name)
            .bind(payload.price)
            .bind(payload.length)
            .bind(payload.width)
            .bind(payload.height)
            .bind(payload.material_id)
            .bind(payload.scene_id)
            .bind(payload.style_id)
            .bind(payload.paint_id)
            .bind(payload.decoration_id)
            .bind(payload.carve_type_id)
            .bind(payload.stove_id)
            .bind(payload.sand_grade_id)
            .bind(payload.is_suite && !is_component)
            .bind(is_component)
            .bind(suite_id)
            .fetch_one(executor)
            .await?;
        Ok(item)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Item>, AppError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn find_components(&self, suite_id: i32) -> Result<Vec<Item>, AppError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE suite_id = $1 AND NOT is_deleted ORDER BY id"
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(suite_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Listed items (not deleted, not components), newest first.
    pub async fn list_page(
        &self,
        vendor_id: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Item>, i64), AppError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE NOT is_deleted AND NOT is_component AND ($1::INTEGER IS NULL OR vendor_id = $1) \
             ORDER BY id DESC LIMIT $2 OFFSET $3"
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(vendor_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM items \
             WHERE NOT is_deleted AND NOT is_component AND ($1::INTEGER IS NULL OR vendor_id = $1)",
        )
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok((items, total))
    }

    /// Soft-deletes an item and its components. Returns false if nothing matched.
    pub async fn soft_delete(&self, vendor_id: i32, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE items SET is_deleted = TRUE \
             WHERE (id = $1 OR suite_id = $1) AND vendor_id = $2 AND NOT is_deleted",
        )
        .bind(id)
        .bind(vendor_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
