// src/models/admin.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::common::pagination::DEFAULT_PER_PAGE;

// Back-office dashboard counters.
#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub items: i64,
    pub vendors: i64,
    pub distributors: i64,
    pub vendors_to_confirm: i64,
    pub distributors_to_revoke: i64,
}

/// One page of a back-office table.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataTable<T> {
    pub records_total: i64,
    pub data: Vec<T>,
}

/// `?start=&length=` as sent by back-office tables.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TableQuery {
    pub start: Option<i64>,
    pub length: Option<i64>,
}

impl TableQuery {
    pub fn offset(&self) -> i64 {
        self.start.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.length.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100)
    }
}
