// src/db/dashboard_repo.rs

use sqlx::{Acquire, PgPool, Postgres};

use crate::{common::error::AppError, models::admin::Statistics};

// Back-office counters.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn statistics(&self) -> Result<Statistics, AppError> {
        self.statistics_with(&self.pool).await
    }

    pub async fn statistics_with<'e, E>(&self, executor: E) -> Result<Statistics, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        // One snapshot for every counter.
        let mut tx = executor.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let items: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM items WHERE NOT is_deleted AND NOT is_component",
        )
        .fetch_one(&mut *tx)
        .await?;

        let vendors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors WHERE confirmed")
            .fetch_one(&mut *tx)
            .await?;

        let distributors: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM distributors WHERE NOT is_revoked")
                .fetch_one(&mut *tx)
                .await?;

        let vendors_to_confirm: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vendors WHERE NOT confirmed AND NOT rejected",
        )
        .fetch_one(&mut *tx)
        .await?;

        let distributors_to_revoke: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM distributor_revocations WHERE pending")
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(Statistics {
            items,
            vendors,
            distributors,
            vendors_to_confirm,
            distributors_to_revoke,
        })
    }
}
