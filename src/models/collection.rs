// src/models/collection.rs

use serde::Deserialize;
use utoipa::ToSchema;

/// Body of "add to my collection".
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPayload {
    pub item_id: i32,
}
