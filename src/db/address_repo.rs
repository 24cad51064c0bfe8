// src/db/address_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::address::{Address, AddressOwner, AddressPayload},
};

// One address row per owner; the table depends on the owner kind.
#[derive(Clone)]
pub struct AddressRepository {
    pool: PgPool,
}

impl AddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find(&self, owner: AddressOwner, owner_id: i32) -> Result<Option<Address>, AppError> {
        self.find_with(&self.pool, owner, owner_id).await
    }

    pub async fn find_with<'e, E>(
        &self,
        executor: E,
        owner: AddressOwner,
        owner_id: i32,
    ) -> Result<Option<Address>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT id, owner_id, cn_id, address, longitude, latitude, created_at, updated_at \
             FROM {} WHERE owner_id = $1",
            owner.table()
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(owner_id)
            .fetch_optional(executor)
            .await?;
        Ok(address)
    }

    /// Creates the owner's address or replaces it in place.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        owner: AddressOwner,
        owner_id: i32,
        payload: &AddressPayload,
    ) -> Result<Address, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {} (owner_id, cn_id, address, longitude, latitude) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (owner_id) DO UPDATE SET \
                 cn_id = EXCLUDED.cn_id, address = EXCLUDED.address, \
                 longitude = EXCLUDED.longitude, latitude = EXCLUDED.latitude, \
                 updated_at = NOW() \
             RETURNING id, owner_id, cn_id, address, longitude, latitude, created_at, updated_at",
            owner.table()
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(owner_id)
            .bind(payload.cn_id)
            .bind(&payload.address)
            .bind(payload.longitude)
            .bind(payload.latitude)
            .fetch_one(executor)
            .await?;
        Ok(address)
    }
}
