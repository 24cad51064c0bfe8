// src/models/vendor.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::address::{AddressPayload, FormattedAddress};
use crate::models::auth::validate_mobile;

// Furniture manufacturer. Publishing requires admin confirmation.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: i32,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub mobile: String,
    pub email: Option<String>,
    pub brand: String,
    pub legal_person_name: String,
    pub legal_person_identity: String,
    pub license_address: String,
    /// `YYYYMMDD`, absent for long-term licenses.
    pub license_limit: Option<String>,
    pub license_long_time: bool,
    pub contact_mobile: String,
    pub contact_telephone: String,
    pub confirmed: bool,
    pub rejected: bool,
    pub reject_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfile {
    pub vendor: Vendor,
    pub address: FormattedAddress,
}

fn validate_license(payload: &VendorDetailsPayload) -> Result<(), ValidationError> {
    match (&payload.license_limit, payload.license_long_time) {
        (Some(limit), false) if limit.len() == 8 && limit.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        (None, true) => Ok(()),
        _ => {
            let mut err = ValidationError::new("license_limit");
            err.message = Some("Give the license expiry date (YYYYMMDD) or mark it long-term.".into());
            Err(err)
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_license"))]
pub struct VendorDetailsPayload {
    #[validate(
        length(min = 6, max = 32, message = "The password must have 6 to 32 characters."),
        must_match(other = "confirm_password", message = "Passwords do not match.")
    )]
    pub password: String,
    pub confirm_password: String,

    #[validate(email(message = "Invalid email."))]
    pub email: Option<String>,

    #[validate(length(min = 2, max = 30, message = "The brand must have 2 to 30 characters."))]
    pub brand: String,

    #[validate(length(min = 1, max = 10, message = "Required."))]
    pub legal_person_name: String,

    #[validate(length(equal = 18, message = "Identity numbers have 18 characters."))]
    pub legal_person_identity: String,

    #[validate(length(min = 1, max = 30, message = "Required."))]
    pub license_address: String,

    pub license_limit: Option<String>,

    #[serde(default)]
    pub license_long_time: bool,

    #[validate(custom(function = "validate_mobile"))]
    pub contact_mobile: String,

    #[validate(length(min = 7, max = 15, message = "Invalid telephone number."))]
    pub contact_telephone: String,

    #[validate(nested)]
    pub address: AddressPayload,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectVendorPayload {
    #[validate(length(min = 1, max = 200, message = "Tell the vendor why."))]
    pub message: String,
}
