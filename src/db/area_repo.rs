// src/db/area_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{common::error::AppError, models::area::Area};

const AREA_COLUMNS: &str = "id, cn_id, name, father_id, level, pinyin, pinyin_initial, \
                            is_direct_municipality, distributor_amount";

/// Read/write access to the area tree that the hierarchy logic depends on.
/// Implemented over the pool, over an open transaction and by test fakes.
#[async_trait]
pub trait AreaStore: Send + Sync {
    async fn area_by_id(&self, id: i32) -> Result<Option<Area>, AppError>;

    async fn area_by_cn_id(&self, cn_id: i32) -> Result<Option<Area>, AppError>;

    async fn children_of(&self, id: i32) -> Result<Vec<Area>, AppError>;

    async fn set_distributor_amount(&self, id: i32, amount: i32) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct AreaRepository {
    pool: PgPool,
}

impl AreaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<Area>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {AREA_COLUMNS} FROM areas WHERE id = $1");
        let area = sqlx::query_as::<_, Area>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(area)
    }

    pub async fn find_by_cn_id<'e, E>(&self, executor: E, cn_id: i32) -> Result<Option<Area>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {AREA_COLUMNS} FROM areas WHERE cn_id = $1");
        let area = sqlx::query_as::<_, Area>(&sql)
            .bind(cn_id)
            .fetch_optional(executor)
            .await?;
        Ok(area)
    }

    pub async fn find_children<'e, E>(&self, executor: E, id: i32) -> Result<Vec<Area>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {AREA_COLUMNS} FROM areas WHERE father_id = $1 ORDER BY pinyin, cn_id"
        );
        let areas = sqlx::query_as::<_, Area>(&sql)
            .bind(id)
            .fetch_all(executor)
            .await?;
        Ok(areas)
    }

    pub async fn update_distributor_amount<'e, E>(
        &self,
        executor: E,
        id: i32,
        amount: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE areas SET distributor_amount = $2 WHERE id = $1")
            .bind(id)
            .bind(amount)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Provinces, for the top-level picker.
    pub async fn list_roots(&self) -> Result<Vec<Area>, AppError> {
        self.find_children(&self.pool, crate::models::area::NO_FATHER).await
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM areas")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Bulk insert used by seeding. Ids are kept so `father_id` stays valid.
    pub async fn insert_many<'e, E>(&self, executor: E, areas: &[Area]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if areas.is_empty() {
            return Ok(0);
        }
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO areas (id, cn_id, name, father_id, level, pinyin, pinyin_initial, \
             is_direct_municipality, distributor_amount) ",
        );
        builder.push_values(areas, |mut row, area| {
            row.push_bind(area.id)
                .push_bind(area.cn_id)
                .push_bind(&area.name)
                .push_bind(area.father_id)
                .push_bind(area.level)
                .push_bind(&area.pinyin)
                .push_bind(&area.pinyin_initial)
                .push_bind(area.is_direct_municipality)
                .push_bind(area.distributor_amount);
        });
        let result = builder.build().execute(executor).await?;
        Ok(result.rows_affected())
    }

    // Explicit ids bypass the sequence; move it past them.
    pub async fn sync_id_sequence<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('areas', 'id'), COALESCE(MAX(id), 1)) FROM areas",
        )
        .execute(executor)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AreaStore for AreaRepository {
    async fn area_by_id(&self, id: i32) -> Result<Option<Area>, AppError> {
        self.find_by_id(&self.pool, id).await
    }

    async fn area_by_cn_id(&self, cn_id: i32) -> Result<Option<Area>, AppError> {
        self.find_by_cn_id(&self.pool, cn_id).await
    }

    async fn children_of(&self, id: i32) -> Result<Vec<Area>, AppError> {
        self.find_children(&self.pool, id).await
    }

    async fn set_distributor_amount(&self, id: i32, amount: i32) -> Result<(), AppError> {
        self.update_distributor_amount(&self.pool, id, amount).await
    }
}
