// src/db/collection_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::item::Item};

#[derive(Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adding an item twice is a no-op.
    pub async fn add(&self, user_id: i32, item_id: i32) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO collections (user_id, item_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT collections_user_item_key DO NOTHING",
        )
        .bind(user_id)
        .bind(item_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, user_id: i32, item_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM collections WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Collected items that are still listed, most recently collected first.
    pub async fn list_page(&self, user_id: i32, limit: i64, offset: i64) -> Result<(Vec<Item>, i64), AppError> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT i.id, i.vendor_id, i.name, i.price, i.length, i.width, i.height,
                   i.material_id, i.scene_id, i.style_id, i.paint_id, i.decoration_id,
                   i.carve_type_id, i.stove_id, i.sand_grade_id, i.is_suite, i.is_component,
                   i.suite_id, i.is_deleted, i.created_at
            FROM collections c
            JOIN items i ON i.id = c.item_id
            WHERE c.user_id = $1 AND NOT i.is_deleted
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM collections c JOIN items i ON i.id = c.item_id \
             WHERE c.user_id = $1 AND NOT i.is_deleted",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok((items, total))
    }
}
