// src/db/vendor_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::vendor::{Vendor, VendorDetailsPayload},
};

const VENDOR_COLUMNS: &str = "id, password_hash, mobile, email, brand, legal_person_name, \
                              legal_person_identity, license_address, license_limit, license_long_time, \
                              contact_mobile, contact_telephone, confirmed, rejected, reject_message, created_at";

#[derive(Clone)]
pub struct VendorRepository {
    pool: PgPool,
}

impl VendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        mobile: &str,
        password_hash: &str,
        details: &VendorDetailsPayload,
    ) -> Result<Vendor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO vendors (password_hash, mobile, email, brand, legal_person_name, \
                                  legal_person_identity, license_address, license_limit, \
                                  license_long_time, contact_mobile, contact_telephone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {VENDOR_COLUMNS}"
        );
        sqlx::query_as::<_, Vendor>(&sql)
            .bind(password_hash)
            .bind(mobile)
            .bind(&details.email)
            .bind(&details.brand)
            .bind(&details.legal_person_name)
            .bind(&details.legal_person_identity)
            .bind(&details.license_address)
            .bind(&details.license_limit)
            .bind(details.license_long_time)
            .bind(&details.contact_mobile)
            .bind(&details.contact_telephone)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        if let Some(constraint) = db_err.constraint() {
                            return match constraint {
                                "vendors_mobile_key" => AppError::MobileAlreadyExists,
                                "vendors_brand_key" => AppError::BrandAlreadyExists,
                                _ => AppError::UniqueConstraintViolation(constraint.to_string()),
                            };
                        }
                    }
                }
                AppError::DatabaseError(e)
            })
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Vendor>, AppError> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1");
        let vendor = sqlx::query_as::<_, Vendor>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vendor)
    }

    /// Vendors sign in with their mobile or email.
    pub async fn find_by_login(&self, login: &str) -> Result<Option<Vendor>, AppError> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE mobile = $1 OR email = $1 LIMIT 1");
        let vendor = sqlx::query_as::<_, Vendor>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vendor)
    }

    pub async fn list_pending(&self) -> Result<Vec<Vendor>, AppError> {
        let sql = format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE NOT confirmed AND NOT rejected ORDER BY id"
        );
        let vendors = sqlx::query_as::<_, Vendor>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(vendors)
    }

    pub async fn list_page(&self, limit: i64, offset: i64) -> Result<(Vec<Vendor>, i64), AppError> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY id DESC LIMIT $1 OFFSET $2");
        let vendors = sqlx::query_as::<_, Vendor>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors")
            .fetch_one(&self.pool)
            .await?;
        Ok((vendors, total))
    }

    /// Applies an admin decision to a vendor still awaiting review.
    /// Returns false if the vendor is unknown or already reviewed.
    pub async fn review(&self, id: i32, confirm: bool, message: Option<&str>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE vendors SET confirmed = $2, rejected = NOT $2, reject_message = $3 \
             WHERE id = $1 AND NOT confirmed AND NOT rejected",
        )
        .bind(id)
        .bind(confirm)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
