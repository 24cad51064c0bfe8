// src/services/item_service.rs

use std::sync::Arc;

use sqlx::PgPool;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::{
        error::AppError,
        lazy::{Lazy, LazyAttribute},
        pagination::{Page, PageQuery},
    },
    db::{AttributeLookup, AttributeRepository, ItemRepository, VendorRepository},
    models::item::{Item, ItemAttribute, ItemAttributes, ItemDetail, ItemPayload, ItemSummary, LookupRow},
};

const SCALAR_ATTRIBUTES: usize = 8;

fn scalar_slot(attribute: ItemAttribute) -> Option<usize> {
    match attribute {
        ItemAttribute::Material => Some(0),
        ItemAttribute::Scene => Some(1),
        ItemAttribute::Style => Some(2),
        ItemAttribute::Paint => Some(3),
        ItemAttribute::Decoration => Some(4),
        ItemAttribute::CarveType => Some(5),
        ItemAttribute::Stove => Some(6),
        ItemAttribute::SandGrade => Some(7),
        ItemAttribute::CarveStyles | ItemAttribute::Tenons => None,
    }
}

/// An item plus its attribute labels, each looked up the first time it is read.
pub struct ItemView {
    item: Item,
    lookup: Arc<dyn AttributeLookup>,
    labels: [Lazy<String>; SCALAR_ATTRIBUTES],
    carve_styles: Lazy<Vec<String>>,
    tenons: Lazy<Vec<String>>,
}

impl ItemView {
    pub fn new(item: Item, lookup: Arc<dyn AttributeLookup>) -> Self {
        Self {
            item,
            lookup,
            labels: std::array::from_fn(|_| Lazy::new()),
            carve_styles: Lazy::new(),
            tenons: Lazy::new(),
        }
    }

    pub fn into_item(self) -> Item {
        self.item
    }

    async fn label(&self, attribute: ItemAttribute) -> Result<&str, AppError> {
        let (Some(slot), Some(id)) = (scalar_slot(attribute), self.item.attribute_id(attribute)) else {
            return Err(anyhow::anyhow!("{} is multi-valued", attribute.name()).into());
        };
        let label = self.labels[slot]
            .get_or_resolve(|| async move {
                let found = self.lookup.label(attribute, id).await?;
                attribute.missing_policy().apply(attribute.name(), id, found)
            })
            .await?;
        Ok(label.as_str())
    }

    async fn labels(&self, attribute: ItemAttribute) -> Result<&[String], AppError> {
        let slot = match attribute {
            ItemAttribute::CarveStyles => &self.carve_styles,
            ItemAttribute::Tenons => &self.tenons,
            _ => return Err(anyhow::anyhow!("{} is single-valued", attribute.name()).into()),
        };
        let labels = slot
            .get_or_resolve(|| self.lookup.labels_for_item(attribute, self.item.id))
            .await?;
        Ok(labels.as_slice())
    }

    pub async fn material(&self) -> Result<&str, AppError> {
        self.label(ItemAttribute::Material).await
    }

    pub async fn scene(&self) -> Result<&str, AppError> {
        self.label(ItemAttribute::Scene).await
    }

    pub async fn style(&self) -> Result<&str, AppError> {
        self.label(ItemAttribute::Style).await
    }

    pub async fn paint(&self) -> Result<&str, AppError> {
        self.label(ItemAttribute::Paint).await
    }

    pub async fn decoration(&self) -> Result<&str, AppError> {
        self.label(ItemAttribute::Decoration).await
    }

    pub async fn carve_type(&self) -> Result<&str, AppError> {
        self.label(ItemAttribute::CarveType).await
    }

    pub async fn stove(&self) -> Result<&str, AppError> {
        self.label(ItemAttribute::Stove).await
    }

    pub async fn sand_grade(&self) -> Result<&str, AppError> {
        self.label(ItemAttribute::SandGrade).await
    }

    pub async fn carve_styles(&self) -> Result<&[String], AppError> {
        self.labels(ItemAttribute::CarveStyles).await
    }

    pub async fn tenons(&self) -> Result<&[String], AppError> {
        self.labels(ItemAttribute::Tenons).await
    }

    /// Drops the cached labels of `attributes`; the next read looks them up again.
    pub fn invalidate(&mut self, attributes: &[ItemAttribute]) {
        for &attribute in attributes {
            match attribute {
                ItemAttribute::CarveStyles => {
                    self.carve_styles.invalidate();
                }
                ItemAttribute::Tenons => {
                    self.tenons.invalidate();
                }
                scalar => {
                    if let Some(slot) = scalar_slot(scalar) {
                        self.labels[slot].invalidate();
                    }
                }
            }
        }
    }

    pub async fn attributes(&self) -> Result<ItemAttributes, AppError> {
        Ok(ItemAttributes {
            material: self.material().await?.to_owned(),
            scene: self.scene().await?.to_owned(),
            style: self.style().await?.to_owned(),
            paint: self.paint().await?.to_owned(),
            decoration: self.decoration().await?.to_owned(),
            carve_type: self.carve_type().await?.to_owned(),
            stove: self.stove().await?.to_owned(),
            sand_grade: self.sand_grade().await?.to_owned(),
            carve_styles: self.carve_styles().await?.to_vec(),
            tenons: self.tenons().await?.to_vec(),
        })
    }

    pub async fn summary(self) -> Result<ItemSummary, AppError> {
        let attributes = self.attributes().await?;
        Ok(ItemSummary {
            item: self.item,
            attributes,
        })
    }
}

#[derive(Clone)]
pub struct ItemService {
    pool: PgPool,
    item_repo: ItemRepository,
    vendor_repo: VendorRepository,
    attribute_repo: AttributeRepository,
    lookup: Arc<dyn AttributeLookup>,
}

impl ItemService {
    pub fn new(
        pool: PgPool,
        item_repo: ItemRepository,
        vendor_repo: VendorRepository,
        attribute_repo: AttributeRepository,
    ) -> Self {
        let lookup: Arc<dyn AttributeLookup> = Arc::new(attribute_repo.clone());
        Self {
            pool,
            item_repo,
            vendor_repo,
            attribute_repo,
            lookup,
        }
    }

    pub fn view(&self, item: Item) -> ItemView {
        ItemView::new(item, Arc::clone(&self.lookup))
    }

    pub async fn create(&self, vendor_id: i32, payload: &ItemPayload) -> Result<Item, AppError> {
        self.ensure_confirmed(vendor_id).await?;
        self.insert(vendor_id, payload, None).await
    }

    /// Adds a component to one of the vendor's suites.
    pub async fn add_component(
        &self,
        vendor_id: i32,
        suite_id: i32,
        payload: &ItemPayload,
    ) -> Result<Item, AppError> {
        self.ensure_confirmed(vendor_id).await?;
        let suite = self
            .item_repo
            .find_by_id(suite_id)
            .await?
            .filter(|item| item.vendor_id == vendor_id && !item.is_deleted)
            .ok_or(AppError::NotFound("suite"))?;
        if !suite.is_suite {
            return Err(AppError::Conflict("Components can only be added to a suite.".into()));
        }
        self.insert(vendor_id, payload, Some(suite.id)).await
    }

    async fn insert(&self, vendor_id: i32, payload: &ItemPayload, suite_id: Option<i32>) -> Result<Item, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut unknown = Vec::new();
        for (field, attribute, id) in payload.scalar_ids() {
            if !self.attribute_repo.missing_ids(&mut *tx, attribute, &[id]).await?.is_empty() {
                unknown.push(field);
            }
        }
        let multi = [
            ("carveStyleIds", ItemAttribute::CarveStyles, &payload.carve_style_ids),
            ("tenonIds", ItemAttribute::Tenons, &payload.tenon_ids),
        ];
        for (field, attribute, ids) in multi {
            if !self.attribute_repo.missing_ids(&mut *tx, attribute, ids).await?.is_empty() {
                unknown.push(field);
            }
        }
        check_payload(payload, &unknown)?;

        let item = self.item_repo.create(&mut *tx, vendor_id, payload, suite_id).await?;
        for (_, attribute, ids) in multi {
            self.attribute_repo.link_item(&mut *tx, attribute, item.id, ids).await?;
        }
        tx.commit().await?;

        tracing::info!(item_id = item.id, vendor_id, suite_id = ?suite_id, "item created");
        Ok(item)
    }

    async fn ensure_confirmed(&self, vendor_id: i32) -> Result<(), AppError> {
        let vendor = self
            .vendor_repo
            .find_by_id(vendor_id)
            .await?
            .ok_or(AppError::NotFound("vendor"))?;
        if !vendor.confirmed {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    pub async fn detail(&self, id: i32) -> Result<ItemDetail, AppError> {
        let item = self
            .item_repo
            .find_by_id(id)
            .await?
            .filter(|item| !item.is_deleted)
            .ok_or(AppError::NotFound("item"))?;

        let mut components = Vec::new();
        if item.is_suite {
            for component in self.item_repo.find_components(item.id).await? {
                components.push(self.view(component).summary().await?);
            }
        }

        let view = self.view(item);
        let attributes = view.attributes().await?;
        Ok(ItemDetail {
            item: view.into_item(),
            attributes,
            components,
        })
    }

    pub async fn list(&self, vendor_id: Option<i32>, query: &PageQuery) -> Result<Page<ItemSummary>, AppError> {
        let (items, amount) = self
            .item_repo
            .list_page(vendor_id, query.per_page(), query.offset())
            .await?;
        let mut summaries = Vec::with_capacity(items.len());
        for item in items {
            summaries.push(self.view(item).summary().await?);
        }
        Ok(Page::new(summaries, amount, query))
    }

    pub async fn delete(&self, vendor_id: i32, id: i32) -> Result<(), AppError> {
        if !self.item_repo.soft_delete(vendor_id, id).await? {
            return Err(AppError::NotFound("item"));
        }
        tracing::info!(item_id = id, vendor_id, "item deleted");
        Ok(())
    }

    pub async fn choices(&self, attribute: ItemAttribute) -> Result<Vec<LookupRow>, AppError> {
        self.attribute_repo.choices(attribute).await
    }

    /// Loads a listed item, for callers that reference items by id.
    pub async fn listed(&self, id: i32) -> Result<Item, AppError> {
        self.item_repo
            .find_by_id(id)
            .await?
            .filter(Item::is_listed)
            .ok_or(AppError::NotFound("item"))
    }
}

/// Field rules and unknown choices, reported together.
fn check_payload(payload: &ItemPayload, unknown_fields: &[&'static str]) -> Result<(), AppError> {
    let mut errors = match payload.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    for &field in unknown_fields {
        errors.add(field, unknown_choice());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(errors))
    }
}

fn unknown_choice() -> ValidationError {
    let mut err = ValidationError::new("unknown_choice");
    err.message = Some("Unknown option.".into());
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::IntegrityError;
    use crate::common::lazy::PLACEHOLDER;
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::{mock, predicate::eq};
    use rust_decimal::Decimal;

    mock! {
        pub Lookup {}
        #[async_trait]
        impl AttributeLookup for Lookup {
            async fn label(&self, attribute: ItemAttribute, id: i32) -> Result<Option<String>, AppError>;
            async fn labels_for_item(&self, attribute: ItemAttribute, item_id: i32) -> Result<Vec<String>, AppError>;
        }
    }

    fn item() -> Item {
        Item {
            id: 9,
            vendor_id: 1,
            name: "罗汉床".into(),
            price: Decimal::new(1_280_000, 2),
            length: 2000,
            width: 1000,
            height: 900,
            material_id: 1,
            scene_id: 2,
            style_id: 3,
            paint_id: 4,
            decoration_id: 5,
            carve_type_id: 6,
            stove_id: 7,
            sand_grade_id: 8,
            is_suite: false,
            is_component: false,
            suite_id: None,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn each_label_is_looked_up_once() {
        let mut lookup = MockLookup::new();
        lookup
            .expect_label()
            .with(eq(ItemAttribute::Material), eq(1))
            .times(1)
            .returning(|_, _| Ok(Some("紫檀".into())));

        let view = ItemView::new(item(), Arc::new(lookup));
        assert_eq!(view.material().await.unwrap(), "紫檀");
        assert_eq!(view.material().await.unwrap(), "紫檀");
    }

    #[tokio::test]
    async fn invalidated_labels_are_looked_up_again() {
        let mut lookup = MockLookup::new();
        let mut calls = 0;
        lookup
            .expect_labels_for_item()
            .with(eq(ItemAttribute::Tenons), eq(9))
            .times(2)
            .returning(move |_, _| {
                calls += 1;
                Ok(vec![format!("燕尾榫{calls}")])
            });

        let mut view = ItemView::new(item(), Arc::new(lookup));
        assert_eq!(view.tenons().await.unwrap(), ["燕尾榫1"]);
        view.invalidate(&[ItemAttribute::Tenons, ItemAttribute::Paint]);
        assert_eq!(view.tenons().await.unwrap(), ["燕尾榫2"]);
    }

    #[tokio::test]
    async fn missing_rows_follow_the_attribute_policy() {
        let mut lookup = MockLookup::new();
        lookup.expect_label().returning(|_, _| Ok(None));

        let view = ItemView::new(item(), Arc::new(lookup));
        assert_eq!(view.paint().await.unwrap(), PLACEHOLDER);

        let err = view.material().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Integrity(IntegrityError::MissingReference { attribute: "material", id: 1 })
        ));
    }

    #[tokio::test]
    async fn attributes_collects_every_label() {
        let mut lookup = MockLookup::new();
        lookup
            .expect_label()
            .times(8)
            .returning(|attribute, id| Ok(Some(format!("{}-{id}", attribute.name()))));
        lookup
            .expect_labels_for_item()
            .times(2)
            .returning(|attribute, _| Ok(vec![attribute.name().to_owned()]));

        let view = ItemView::new(item(), Arc::new(lookup));
        let attributes = view.attributes().await.unwrap();
        assert_eq!(attributes.material, "material-1");
        assert_eq!(attributes.sand_grade, "sandGrade-8");
        assert_eq!(attributes.carve_styles, ["carveStyles"]);

        // Everything is cached now.
        view.attributes().await.unwrap();
    }

    fn payload() -> ItemPayload {
        ItemPayload {
            name: "圈椅".into(),
            price: Decimal::new(680_000, 2),
            length: 600,
            width: 500,
            height: 1000,
            material_id: 1,
            scene_id: 2,
            style_id: 3,
            paint_id: 4,
            decoration_id: 5,
            carve_type_id: 6,
            stove_id: 7,
            sand_grade_id: 8,
            carve_style_ids: vec![],
            tenon_ids: vec![1],
            is_suite: false,
        }
    }

    #[test]
    fn field_rules_and_unknown_choices_are_reported_together() {
        let mut invalid = payload();
        invalid.name = String::new();

        let Err(AppError::ValidationError(errors)) = check_payload(&invalid, &["materialId"]) else {
            panic!("expected a validation error");
        };
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("materialId"));
    }

    #[test]
    fn a_clean_payload_passes() {
        assert!(check_payload(&payload(), &[]).is_ok());
    }
}
