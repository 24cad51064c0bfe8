// src/models/auth.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::workflow::VerifiedContact;

static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^1[3-8]\d{9}$").unwrap());
static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w{4,30}$").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d*$").unwrap());

pub fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    if !MOBILE_RE.is_match(mobile) {
        let mut err = ValidationError::new("mobile");
        err.message = Some("Invalid mobile number.".into());
        return Err(err);
    }
    Ok(())
}

// 4-30 word characters (CJK included) and not purely numeric, so a username
// can never be mistaken for a mobile number at login.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !USERNAME_RE.is_match(username) || DIGITS_RE.is_match(username) {
        let mut err = ValidationError::new("username");
        err.message = Some("Invalid username.".into());
        return Err(err);
    }
    Ok(())
}

/// Account kind carried in every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Vendor,
    Distributor,
    Admin,
}

// End-user account.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub mobile: String,
    pub email: Option<String>,
    pub email_confirmed: bool,
    pub username_revisable: bool,
    pub created_at: DateTime<Utc>,
}

// Back-office account.
#[derive(Debug, Clone, FromRow)]
pub struct Privilege {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

/// Authenticated caller, as decoded from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    /// Username, mobile or email, depending on the account kind.
    #[validate(length(min = 1, message = "Required."))]
    pub username: String,
    #[validate(length(min = 6, max = 32, message = "The password must have 6 to 32 characters."))]
    pub password: String,
}

fn validate_single_contact(payload: &ContactStepPayload) -> Result<(), ValidationError> {
    if payload.mobile.is_some() == payload.email.is_some() {
        let mut err = ValidationError::new("contact");
        err.message = Some("Give either a mobile number or an email.".into());
        return Err(err);
    }
    Ok(())
}

/// Step 1 of every two-step flow: prove ownership of a mobile number or email.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_single_contact"))]
pub struct ContactStepPayload {
    #[validate(custom(function = "validate_mobile"))]
    #[schema(example = "13800138000")]
    pub mobile: Option<String>,
    #[validate(email(message = "Invalid email."))]
    pub email: Option<String>,
    #[validate(length(equal = 6, message = "The captcha has 6 digits."))]
    pub captcha: String,
}

impl ContactStepPayload {
    pub fn contact(&self) -> Option<VerifiedContact> {
        match (&self.mobile, &self.email) {
            (Some(mobile), None) => Some(VerifiedContact::Mobile(mobile.clone())),
            (None, Some(email)) => Some(VerifiedContact::Email(email.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsPayload {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(
        length(min = 6, max = 32, message = "The password must have 6 to 32 characters."),
        must_match(other = "confirm_password", message = "Passwords do not match.")
    )]
    pub password: String,
    pub confirm_password: String,
    #[validate(email(message = "Invalid email."))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    #[validate(
        length(min = 6, max = 32, message = "The password must have 6 to 32 characters."),
        must_match(other = "confirm_password", message = "Passwords do not match.")
    )]
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub role: Role,
}

// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_numbers_follow_the_carrier_prefixes() {
        assert!(validate_mobile("13800138000").is_ok());
        assert!(validate_mobile("12800138000").is_err());
        assert!(validate_mobile("1380013800").is_err());
    }

    #[test]
    fn usernames_cannot_be_numeric() {
        assert!(validate_username("木匠老王").is_ok());
        assert!(validate_username("carpenter_1").is_ok());
        assert!(validate_username("13800138000").is_err());
        assert!(validate_username("abc").is_err());
    }

    #[test]
    fn passwords_must_match() {
        let payload = UserDetailsPayload {
            username: "carpenter".into(),
            password: "secret-1".into(),
            confirm_password: "secret-2".into(),
            email: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
