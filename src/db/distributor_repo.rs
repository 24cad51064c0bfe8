// src/db/distributor_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::distributor::{Distributor, DistributorRevocation},
};

const DISTRIBUTOR_COLUMNS: &str = "d.id, d.vendor_id, d.username, d.password_hash, d.name, d.contact, \
                                   d.contact_mobile, d.contact_telephone, d.is_revoked, d.created_at";

/// Counts the distributors a city's cached counter is derived from.
#[async_trait]
pub trait DistributorCensus: Send + Sync {
    /// Non-revoked distributors whose address code is one of `cn_ids`.
    async fn count_active_in(&self, cn_ids: &[i32]) -> Result<i64, AppError>;
}

#[derive(Clone)]
pub struct DistributorRepository {
    pool: PgPool,
}

impl DistributorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count_active<'e, E>(&self, executor: E, cn_ids: &[i32]) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM distributors d
            JOIN distributor_addresses a ON a.owner_id = d.id
            WHERE NOT d.is_revoked AND a.cn_id = ANY($1)
            "#,
        )
        .bind(cn_ids)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        vendor_id: i32,
        username: &str,
        password_hash: &str,
        name: &str,
        contact: &str,
        contact_mobile: &str,
        contact_telephone: &str,
    ) -> Result<Distributor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Distributor>(
            r#"
            INSERT INTO distributors (vendor_id, username, password_hash, name, contact,
                                      contact_mobile, contact_telephone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, vendor_id, username, password_hash, name, contact,
                      contact_mobile, contact_telephone, is_revoked, created_at
            "#,
        )
        .bind(vendor_id)
        .bind(username)
        .bind(password_hash)
        .bind(name)
        .bind(contact)
        .bind(contact_mobile)
        .bind(contact_telephone)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("distributors_username_key") => AppError::UsernameAlreadyExists,
                        Some(other) => AppError::UniqueConstraintViolation(other.to_string()),
                        None => AppError::DatabaseError(e),
                    };
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<Distributor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {DISTRIBUTOR_COLUMNS} FROM distributors d WHERE d.id = $1");
        let distributor = sqlx::query_as::<_, Distributor>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(distributor)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Distributor>, AppError> {
        let sql = format!("SELECT {DISTRIBUTOR_COLUMNS} FROM distributors d WHERE d.username = $1");
        let distributor = sqlx::query_as::<_, Distributor>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(distributor)
    }

    pub async fn list_by_vendor(&self, vendor_id: i32) -> Result<Vec<Distributor>, AppError> {
        let sql = format!(
            "SELECT {DISTRIBUTOR_COLUMNS} FROM distributors d \
             WHERE d.vendor_id = $1 ORDER BY d.id DESC"
        );
        let distributors = sqlx::query_as::<_, Distributor>(&sql)
            .bind(vendor_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(distributors)
    }

    /// Active distributors located in any of `cn_ids`.
    pub async fn list_active_in(&self, cn_ids: &[i32]) -> Result<Vec<Distributor>, AppError> {
        let sql = format!(
            "SELECT {DISTRIBUTOR_COLUMNS} FROM distributors d \
             JOIN distributor_addresses a ON a.owner_id = d.id \
             WHERE NOT d.is_revoked AND a.cn_id = ANY($1) ORDER BY d.id"
        );
        let distributors = sqlx::query_as::<_, Distributor>(&sql)
            .bind(cn_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(distributors)
    }

    pub async fn list_page(&self, limit: i64, offset: i64) -> Result<(Vec<Distributor>, i64), AppError> {
        let sql = format!(
            "SELECT {DISTRIBUTOR_COLUMNS} FROM distributors d ORDER BY d.id DESC LIMIT $1 OFFSET $2"
        );
        let distributors = sqlx::query_as::<_, Distributor>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM distributors")
            .fetch_one(&self.pool)
            .await?;
        Ok((distributors, total))
    }

    pub async fn mark_revoked<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE distributors SET is_revoked = TRUE WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // --- Revocation requests ---

    pub async fn create_revocation<'e, E>(
        &self,
        executor: E,
        distributor_id: i32,
        contract: &str,
    ) -> Result<DistributorRevocation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let revocation = sqlx::query_as::<_, DistributorRevocation>(
            r#"
            INSERT INTO distributor_revocations (distributor_id, contract)
            VALUES ($1, $2)
            RETURNING id, distributor_id, contract, pending, created_at
            "#,
        )
        .bind(distributor_id)
        .bind(contract)
        .fetch_one(executor)
        .await?;
        Ok(revocation)
    }

    pub async fn has_pending_revocation(&self, distributor_id: i32) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM distributor_revocations WHERE distributor_id = $1 AND pending)",
        )
        .bind(distributor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn find_revocation<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<DistributorRevocation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let revocation = sqlx::query_as::<_, DistributorRevocation>(
            "SELECT id, distributor_id, contract, pending, created_at \
             FROM distributor_revocations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(revocation)
    }

    pub async fn list_pending_revocations(&self) -> Result<Vec<DistributorRevocation>, AppError> {
        let revocations = sqlx::query_as::<_, DistributorRevocation>(
            "SELECT id, distributor_id, contract, pending, created_at \
             FROM distributor_revocations WHERE pending ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(revocations)
    }

    pub async fn close_revocation<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE distributor_revocations SET pending = FALSE WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DistributorCensus for DistributorRepository {
    async fn count_active_in(&self, cn_ids: &[i32]) -> Result<i64, AppError> {
        self.count_active(&self.pool, cn_ids).await
    }
}
