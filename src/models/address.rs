// src/models/address.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Which account an address row belongs to. Each owner kind has its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AddressOwner {
    User,
    Vendor,
    Distributor,
}

impl AddressOwner {
    pub fn table(self) -> &'static str {
        match self {
            AddressOwner::User => "user_addresses",
            AddressOwner::Vendor => "vendor_addresses",
            AddressOwner::Distributor => "distributor_addresses",
        }
    }
}

// `cn_id` is the area's business code, not its row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i32,
    pub owner_id: i32,
    pub cn_id: i32,
    /// Street detail typed by the owner.
    pub address: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAddress {
    pub cn_id: i32,
    pub detail: String,
    #[schema(example = "北京东城区")]
    pub vague: String,
    #[schema(example = "北京东城区东四十条 12 号")]
    pub precise: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[validate(range(min = 100000, max = 999999, message = "Unknown area code."))]
    #[schema(example = 110101)]
    pub cn_id: i32,

    #[validate(length(min = 1, max = 30, message = "Street detail must have 1 to 30 characters."))]
    pub address: String,

    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}
