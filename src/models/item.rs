// src/models/item.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::common::lazy::{LazyAttribute, MissingPolicy, PLACEHOLDER};

// --- Catalog item ---
// Only lookup ids are stored here; labels are resolved on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i32,
    pub vendor_id: i32,
    pub name: String,
    #[schema(value_type = f64, example = 12800.0)]
    pub price: Decimal,
    pub length: i32,
    pub width: i32,
    pub height: i32,
    pub material_id: i32,
    pub scene_id: i32,
    pub style_id: i32,
    pub paint_id: i32,
    pub decoration_id: i32,
    pub carve_type_id: i32,
    pub stove_id: i32,
    pub sand_grade_id: i32,
    pub is_suite: bool,
    pub is_component: bool,
    pub suite_id: Option<i32>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Whether the item can be shown, collected or ordered on its own.
    pub fn is_listed(&self) -> bool {
        !self.is_deleted && !self.is_component
    }

    /// The lookup id behind a single-valued attribute.
    pub fn attribute_id(&self, attribute: ItemAttribute) -> Option<i32> {
        match attribute {
            ItemAttribute::Material => Some(self.material_id),
            ItemAttribute::Scene => Some(self.scene_id),
            ItemAttribute::Style => Some(self.style_id),
            ItemAttribute::Paint => Some(self.paint_id),
            ItemAttribute::Decoration => Some(self.decoration_id),
            ItemAttribute::CarveType => Some(self.carve_type_id),
            ItemAttribute::Stove => Some(self.stove_id),
            ItemAttribute::SandGrade => Some(self.sand_grade_id),
            ItemAttribute::CarveStyles | ItemAttribute::Tenons => None,
        }
    }
}

/// Descriptive attributes of an item, each backed by a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ItemAttribute {
    Material,
    Scene,
    Style,
    Paint,
    Decoration,
    CarveType,
    Stove,
    SandGrade,
    CarveStyles,
    Tenons,
}

impl ItemAttribute {
    pub const ALL: [ItemAttribute; 10] = [
        ItemAttribute::Material,
        ItemAttribute::Scene,
        ItemAttribute::Style,
        ItemAttribute::Paint,
        ItemAttribute::Decoration,
        ItemAttribute::CarveType,
        ItemAttribute::Stove,
        ItemAttribute::SandGrade,
        ItemAttribute::CarveStyles,
        ItemAttribute::Tenons,
    ];

    pub fn lookup_table(self) -> &'static str {
        match self {
            ItemAttribute::Material => "materials",
            ItemAttribute::Scene => "scenes",
            ItemAttribute::Style => "styles",
            ItemAttribute::Paint => "paints",
            ItemAttribute::Decoration => "decorations",
            ItemAttribute::CarveType => "carve_types",
            ItemAttribute::Stove => "stoves",
            ItemAttribute::SandGrade => "sand_grades",
            ItemAttribute::CarveStyles => "carve_styles",
            ItemAttribute::Tenons => "tenons",
        }
    }

    /// `(join table, lookup id column)` for multi-valued attributes.
    pub fn join_table(self) -> Option<(&'static str, &'static str)> {
        match self {
            ItemAttribute::CarveStyles => Some(("item_carve_styles", "carve_style_id")),
            ItemAttribute::Tenons => Some(("item_tenons", "tenon_id")),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl LazyAttribute for ItemAttribute {
    fn name(self) -> &'static str {
        match self {
            ItemAttribute::Material => "material",
            ItemAttribute::Scene => "scene",
            ItemAttribute::Style => "style",
            ItemAttribute::Paint => "paint",
            ItemAttribute::Decoration => "decoration",
            ItemAttribute::CarveType => "carveType",
            ItemAttribute::Stove => "stove",
            ItemAttribute::SandGrade => "sandGrade",
            ItemAttribute::CarveStyles => "carveStyles",
            ItemAttribute::Tenons => "tenons",
        }
    }

    // An item without a material or scene cannot be catalogued at all.
    fn missing_policy(self) -> MissingPolicy {
        match self {
            ItemAttribute::Material | ItemAttribute::Scene => MissingPolicy::Fail,
            _ => MissingPolicy::Placeholder(PLACEHOLDER),
        }
    }
}

// A row of any lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LookupRow {
    pub id: i32,
    pub name: String,
}

/// Every attribute label of an item, as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemAttributes {
    pub material: String,
    pub scene: String,
    pub style: String,
    pub paint: String,
    pub decoration: String,
    pub carve_type: String,
    pub stove: String,
    pub sand_grade: String,
    pub carve_styles: Vec<String>,
    pub tenons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item: Item,
    pub attributes: ItemAttributes,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub item: Item,
    pub attributes: ItemAttributes,
    /// Empty unless the item is a suite.
    pub components: Vec<ItemSummary>,
}

fn validate_ids_not_empty(ids: &[i32]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Pick at least one value.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() || price.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("The price must be positive.".into());
        return Err(err);
    }
    Ok(())
}

// Used both for standalone items/suites and for suite components.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    #[validate(length(min = 1, max = 60, message = "The item name is required."))]
    pub name: String,

    #[validate(custom(function = "validate_positive_price"))]
    #[schema(value_type = f64)]
    pub price: Decimal,

    #[validate(range(min = 1, message = "Dimensions must be positive."))]
    pub length: i32,
    #[validate(range(min = 1, message = "Dimensions must be positive."))]
    pub width: i32,
    #[validate(range(min = 1, message = "Dimensions must be positive."))]
    pub height: i32,

    pub material_id: i32,
    pub scene_id: i32,
    pub style_id: i32,
    pub paint_id: i32,
    pub decoration_id: i32,
    pub carve_type_id: i32,
    pub stove_id: i32,
    pub sand_grade_id: i32,

    #[serde(default)]
    pub carve_style_ids: Vec<i32>,

    #[validate(custom(function = "validate_ids_not_empty"))]
    pub tenon_ids: Vec<i32>,

    /// Ignored for components.
    #[serde(default)]
    pub is_suite: bool,
}

impl ItemPayload {
    /// Field name, attribute and lookup id of every single-valued attribute.
    pub fn scalar_ids(&self) -> [(&'static str, ItemAttribute, i32); 8] {
        [
            ("materialId", ItemAttribute::Material, self.material_id),
            ("sceneId", ItemAttribute::Scene, self.scene_id),
            ("styleId", ItemAttribute::Style, self.style_id),
            ("paintId", ItemAttribute::Paint, self.paint_id),
            ("decorationId", ItemAttribute::Decoration, self.decoration_id),
            ("carveTypeId", ItemAttribute::CarveType, self.carve_type_id),
            ("stoveId", ItemAttribute::Stove, self.stove_id),
            ("sandGradeId", ItemAttribute::SandGrade, self.sand_grade_id),
        ]
    }
}
