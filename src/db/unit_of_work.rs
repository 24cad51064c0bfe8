// src/db/unit_of_work.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    common::error::AppError,
    db::{
        area_repo::{AreaRepository, AreaStore},
        distributor_repo::{DistributorCensus, DistributorRepository},
    },
    models::area::Area,
};

/// An open transaction that also serves the area and census traits, so the
/// counter recompute sees (and is rolled back with) the writes before it.
pub struct PgUnitOfWork {
    tx: Mutex<Transaction<'static, Postgres>>,
    areas: AreaRepository,
    distributors: DistributorRepository,
}

impl PgUnitOfWork {
    pub async fn begin(
        pool: &PgPool,
        areas: AreaRepository,
        distributors: DistributorRepository,
    ) -> Result<Self, AppError> {
        let tx = pool.begin().await?;
        Ok(Self {
            tx: Mutex::new(tx),
            areas,
            distributors,
        })
    }

    /// Exclusive access to the transaction for other repository calls.
    /// Drop the guard before using the unit of work as a store again.
    pub async fn lock(&self) -> MutexGuard<'_, Transaction<'static, Postgres>> {
        self.tx.lock().await
    }

    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AreaStore for PgUnitOfWork {
    async fn area_by_id(&self, id: i32) -> Result<Option<Area>, AppError> {
        let mut tx = self.tx.lock().await;
        self.areas.find_by_id(&mut **tx, id).await
    }

    async fn area_by_cn_id(&self, cn_id: i32) -> Result<Option<Area>, AppError> {
        let mut tx = self.tx.lock().await;
        self.areas.find_by_cn_id(&mut **tx, cn_id).await
    }

    async fn children_of(&self, id: i32) -> Result<Vec<Area>, AppError> {
        let mut tx = self.tx.lock().await;
        self.areas.find_children(&mut **tx, id).await
    }

    async fn set_distributor_amount(&self, id: i32, amount: i32) -> Result<(), AppError> {
        let mut tx = self.tx.lock().await;
        self.areas.update_distributor_amount(&mut **tx, id, amount).await
    }
}

#[async_trait]
impl DistributorCensus for PgUnitOfWork {
    async fn count_active_in(&self, cn_ids: &[i32]) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        self.distributors.count_active(&mut **tx, cn_ids).await
    }
}
