// src/models/area.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const PROVINCE: i16 = 1;
pub const CITY: i16 = 2;
pub const DISTRICT: i16 = 3;

/// `father_id` of a province.
pub const NO_FATHER: i32 = 0;

/// City-level names that repeat their province. Only consulted when rows are
/// imported, to set `is_direct_municipality`.
pub const DIRECT_MUNICIPALITY_NAMES: [&str; 4] = ["北京市", "上海市", "天津市", "重庆市"];

// One node of the province -> city -> district tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: i32,
    #[schema(example = 110101)]
    pub cn_id: i32,
    #[schema(example = "东城区")]
    pub name: String,
    pub father_id: i32,
    #[schema(example = 3)]
    pub level: i16,
    pub pinyin: String,
    pub pinyin_initial: String,
    pub is_direct_municipality: bool,
    pub distributor_amount: i32,
}

impl Area {
    pub fn is_root(&self) -> bool {
        self.father_id == NO_FATHER
    }
}

/// A row of the area seed file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSeed {
    pub id: i32,
    pub cn_id: i32,
    pub name: String,
    #[serde(default)]
    pub father_id: i32,
    pub level: i16,
    #[serde(default)]
    pub pinyin: String,
    #[serde(default)]
    pub pinyin_initial: String,
}

impl From<AreaSeed> for Area {
    fn from(seed: AreaSeed) -> Self {
        let is_direct_municipality =
            seed.level == CITY && DIRECT_MUNICIPALITY_NAMES.contains(&seed.name.as_str());
        Area {
            id: seed.id,
            cn_id: seed.cn_id,
            name: seed.name,
            father_id: seed.father_id,
            level: seed.level,
            pinyin: seed.pinyin,
            pinyin_initial: seed.pinyin_initial,
            is_direct_municipality,
            distributor_amount: 0,
        }
    }
}
