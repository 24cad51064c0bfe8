// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::AppError,
    db::{DistributorRepository, PrivilegeRepository, UserRepository, VendorRepository},
    models::{
        auth::{AuthResponse, Claims, Principal, ResetPasswordPayload, Role, User, UserDetailsPayload},
        workflow::VerifiedContact,
    },
};

const TOKEN_LIFETIME_DAYS: i64 = 7;

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("hashing task failed: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    vendor_repo: VendorRepository,
    distributor_repo: DistributorRepository,
    privilege_repo: PrivilegeRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        vendor_repo: VendorRepository,
        distributor_repo: DistributorRepository,
        privilege_repo: PrivilegeRepository,
        jwt_secret: String,
    ) -> Self {
        Self {
            user_repo,
            vendor_repo,
            distributor_repo,
            privilege_repo,
            jwt_secret,
        }
    }

    /// Creates the account at the end of the registration flow.
    pub async fn register_user(
        &self,
        contact: &VerifiedContact,
        details: &UserDetailsPayload,
    ) -> Result<AuthResponse, AppError> {
        let mobile = contact.mobile().ok_or(AppError::InvalidCredentials)?;
        if self.user_repo.mobile_taken(mobile).await? {
            return Err(AppError::MobileAlreadyExists);
        }

        let password_hash = hash_password(&details.password).await?;
        let user = self
            .user_repo
            .create_user(
                self.user_repo.pool(),
                &details.username,
                &password_hash,
                mobile,
                details.email.as_deref(),
            )
            .await?;

        tracing::info!(user_id = user.id, "user registered");
        self.respond(user.id, Role::User)
    }

    pub async fn reset_password(
        &self,
        contact: &VerifiedContact,
        payload: &ResetPasswordPayload,
    ) -> Result<(), AppError> {
        let user = match contact {
            VerifiedContact::Mobile(mobile) => self.user_repo.find_by_mobile(mobile).await?,
            VerifiedContact::Email(email) => self.user_repo.find_by_email(email).await?,
        }
        .ok_or(AppError::NotFound("account"))?;

        let password_hash = hash_password(&payload.password).await?;
        self.user_repo.update_password(user.id, &password_hash).await?;
        tracing::info!(user_id = user.id, "password reset");
        Ok(())
    }

    pub async fn login_user(&self, login: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        self.check_password(password, &user.password_hash).await?;
        self.respond(user.id, Role::User)
    }

    pub async fn login_vendor(&self, login: &str, password: &str) -> Result<AuthResponse, AppError> {
        let vendor = self
            .vendor_repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        self.check_password(password, &vendor.password_hash).await?;
        self.respond(vendor.id, Role::Vendor)
    }

    pub async fn login_distributor(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let distributor = self
            .distributor_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        self.check_password(password, &distributor.password_hash).await?;
        if distributor.is_revoked {
            return Err(AppError::Forbidden);
        }
        self.respond(distributor.id, Role::Distributor)
    }

    pub async fn login_admin(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let privilege = self
            .privilege_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        self.check_password(password, &privilege.password_hash).await?;
        self.respond(privilege.id, Role::Admin)
    }

    pub async fn me(&self, user_id: i32) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    async fn check_password(&self, password: &str, password_hash: &str) -> Result<(), AppError> {
        if !verify_password(password, password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        Ok(())
    }

    pub fn validate_token(&self, token: &str) -> Result<Principal, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(Principal {
            id: token_data.claims.sub,
            role: token_data.claims.role,
        })
    }

    pub fn create_token(&self, id: i32, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_LIFETIME_DAYS);

        let claims = Claims {
            sub: id,
            role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub fn respond(&self, id: i32, role: Role) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            token: self.create_token(id, role)?,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> AuthService {
        // Never connects; token handling does not touch the database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            VendorRepository::new(pool.clone()),
            DistributorRepository::new(pool.clone()),
            PrivilegeRepository::new(pool),
            "test-secret".into(),
        )
    }

    #[tokio::test]
    async fn tokens_round_trip_the_principal() {
        let auth = service();
        let token = auth.create_token(17, Role::Vendor).unwrap();
        let principal = auth.validate_token(&token).unwrap();
        assert_eq!(principal, Principal { id: 17, role: Role::Vendor });
    }

    #[tokio::test]
    async fn tampered_tokens_are_rejected() {
        let auth = service();
        let mut token = auth.create_token(17, Role::User).unwrap();
        token.push('x');
        assert!(matches!(auth.validate_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn passwords_verify_against_their_hash() {
        let hashed = hash_password("secret-1").await.unwrap();
        assert!(verify_password("secret-1", &hashed).await.unwrap());
        assert!(!verify_password("secret-2", &hashed).await.unwrap());
    }
}
