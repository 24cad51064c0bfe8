// src/services/user_service.rs

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageQuery},
    },
    db::{AddressRepository, AreaRepository, CollectionRepository},
    models::{
        address::{AddressOwner, AddressPayload, FormattedAddress},
        item::ItemSummary,
    },
    services::{area_service, item_service::ItemService},
};

// Profile data and collections of end users.
#[derive(Clone)]
pub struct UserService {
    address_repo: AddressRepository,
    area_repo: AreaRepository,
    collection_repo: CollectionRepository,
    item_service: ItemService,
}

impl UserService {
    pub fn new(
        address_repo: AddressRepository,
        area_repo: AreaRepository,
        collection_repo: CollectionRepository,
        item_service: ItemService,
    ) -> Self {
        Self {
            address_repo,
            area_repo,
            collection_repo,
            item_service,
        }
    }

    pub async fn address(&self, user_id: i32) -> Result<FormattedAddress, AppError> {
        let address = self
            .address_repo
            .find(AddressOwner::User, user_id)
            .await?
            .ok_or(AppError::NotFound("address"))?;
        area_service::format_address(&self.area_repo, &address).await
    }

    pub async fn save_address(&self, user_id: i32, payload: &AddressPayload) -> Result<FormattedAddress, AppError> {
        area_service::require_leaf(&self.area_repo, payload.cn_id).await?;
        let address = self
            .address_repo
            .upsert(self.address_repo.pool(), AddressOwner::User, user_id, payload)
            .await?;
        area_service::format_address(&self.area_repo, &address).await
    }

    pub async fn collect(&self, user_id: i32, item_id: i32) -> Result<(), AppError> {
        let item = self.item_service.listed(item_id).await?;
        self.collection_repo.add(user_id, item.id).await
    }

    pub async fn uncollect(&self, user_id: i32, item_id: i32) -> Result<(), AppError> {
        if !self.collection_repo.remove(user_id, item_id).await? {
            return Err(AppError::NotFound("collection"));
        }
        Ok(())
    }

    pub async fn collections(&self, user_id: i32, query: &PageQuery) -> Result<Page<ItemSummary>, AppError> {
        let (items, amount) = self
            .collection_repo
            .list_page(user_id, query.per_page(), query.offset())
            .await?;
        let mut summaries = Vec::with_capacity(items.len());
        for item in items {
            summaries.push(self.item_service.view(item).summary().await?);
        }
        Ok(Page::new(summaries, amount, query))
    }
}
