// src/db/attribute_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::item::{ItemAttribute, LookupRow},
};

/// Label lookups behind an item's attribute ids.
#[async_trait]
pub trait AttributeLookup: Send + Sync {
    /// Label of one lookup row, `None` if the row is gone.
    async fn label(&self, attribute: ItemAttribute, id: i32) -> Result<Option<String>, AppError>;

    /// Labels of a multi-valued attribute. Dangling join rows are skipped.
    async fn labels_for_item(
        &self,
        attribute: ItemAttribute,
        item_id: i32,
    ) -> Result<Vec<String>, AppError>;
}

#[derive(Clone)]
pub struct AttributeRepository {
    pool: PgPool,
}

impl AttributeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn choices(&self, attribute: ItemAttribute) -> Result<Vec<LookupRow>, AppError> {
        let sql = format!("SELECT id, name FROM {} ORDER BY id", attribute.lookup_table());
        let rows = sqlx::query_as::<_, LookupRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// The subset of `ids` with no row in the attribute's lookup table.
    pub async fn missing_ids<'e, E>(
        &self,
        executor: E,
        attribute: ItemAttribute,
        ids: &[i32],
    ) -> Result<Vec<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT wanted FROM UNNEST($1::INTEGER[]) AS wanted \
             WHERE NOT EXISTS (SELECT 1 FROM {} WHERE id = wanted)",
            attribute.lookup_table()
        );
        let missing: Vec<i32> = sqlx::query_scalar(&sql)
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(missing)
    }

    pub async fn link_item<'e, E>(
        &self,
        executor: E,
        attribute: ItemAttribute,
        item_id: i32,
        ids: &[i32],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some((table, column)) = attribute.join_table() else {
            return Ok(());
        };
        let sql = format!(
            "INSERT INTO {table} (item_id, {column}) \
             SELECT $1, id FROM UNNEST($2::INTEGER[]) AS id ON CONFLICT DO NOTHING"
        );
        sqlx::query(&sql)
            .bind(item_id)
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AttributeLookup for AttributeRepository {
    async fn label(&self, attribute: ItemAttribute, id: i32) -> Result<Option<String>, AppError> {
        let sql = format!("SELECT name FROM {} WHERE id = $1", attribute.lookup_table());
        let name: Option<String> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    async fn labels_for_item(
        &self,
        attribute: ItemAttribute,
        item_id: i32,
    ) -> Result<Vec<String>, AppError> {
        let Some((table, column)) = attribute.join_table() else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT l.name FROM {table} j JOIN {lookup} l ON l.id = j.{column} \
             WHERE j.item_id = $1 ORDER BY l.id",
            lookup = attribute.lookup_table()
        );
        let names: Vec<String> = sqlx::query_scalar(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }
}
