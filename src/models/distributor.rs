// src/models/distributor.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::address::{AddressPayload, FormattedAddress};
use crate::models::auth::{validate_mobile, validate_username};

// Dealer selling a vendor's stock.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Distributor {
    pub id: i32,
    pub vendor_id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub contact: String,
    pub contact_mobile: String,
    pub contact_telephone: String,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributorProfile {
    pub distributor: Distributor,
    pub address: FormattedAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributorRevocation {
    pub id: i32,
    pub distributor_id: i32,
    /// Reference to the uploaded termination contract.
    pub contract: String,
    pub pending: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDistributorPayload {
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(length(min = 6, max = 32, message = "The password must have 6 to 32 characters."))]
    pub password: String,

    #[validate(length(min = 1, max = 30, message = "Required."))]
    pub name: String,

    #[validate(length(min = 1, max = 30, message = "Required."))]
    pub contact: String,

    #[validate(custom(function = "validate_mobile"))]
    pub contact_mobile: String,

    #[validate(length(min = 7, max = 15, message = "Invalid telephone number."))]
    pub contact_telephone: String,

    #[validate(nested)]
    pub address: AddressPayload,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevocationPayload {
    #[validate(length(min = 1, max = 255, message = "The contract reference is required."))]
    pub contract: String,
}

/// Count of active distributors in a city, as cached on the city row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityDistributors {
    pub city_cn_id: i32,
    pub city: String,
    pub distributor_amount: i32,
    pub distributors: Vec<DistributorProfile>,
}
