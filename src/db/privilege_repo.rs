// src/db/privilege_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::auth::Privilege};

#[derive(Clone)]
pub struct PrivilegeRepository {
    pool: PgPool,
}

impl PrivilegeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Privilege>, AppError> {
        let privilege = sqlx::query_as::<_, Privilege>(
            "SELECT id, username, password_hash FROM privileges WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(privilege)
    }
}
