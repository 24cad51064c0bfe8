// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::{DashboardRepository, DistributorRepository, ItemRepository, VendorRepository},
    models::{
        admin::{DataTable, Statistics, TableQuery},
        distributor::DistributorProfile,
        item::ItemSummary,
        vendor::VendorProfile,
    },
    services::{
        distributor_service::DistributorService, item_service::ItemService,
        vendor_service::VendorService,
    },
};

// Back-office overview and listings.
#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    vendor_repo: VendorRepository,
    distributor_repo: DistributorRepository,
    item_repo: ItemRepository,
    vendor_service: VendorService,
    distributor_service: DistributorService,
    item_service: ItemService,
}

impl DashboardService {
    pub fn new(
        repo: DashboardRepository,
        vendor_repo: VendorRepository,
        distributor_repo: DistributorRepository,
        item_repo: ItemRepository,
        vendor_service: VendorService,
        distributor_service: DistributorService,
        item_service: ItemService,
    ) -> Self {
        Self {
            repo,
            vendor_repo,
            distributor_repo,
            item_repo,
            vendor_service,
            distributor_service,
            item_service,
        }
    }

    pub async fn statistics(&self) -> Result<Statistics, AppError> {
        self.repo.statistics().await
    }

    pub async fn vendors(&self, query: &TableQuery) -> Result<DataTable<VendorProfile>, AppError> {
        let (vendors, records_total) = self.vendor_repo.list_page(query.limit(), query.offset()).await?;
        let mut data = Vec::with_capacity(vendors.len());
        for vendor in vendors {
            data.push(self.vendor_service.with_address(vendor).await?);
        }
        Ok(DataTable { records_total, data })
    }

    pub async fn distributors(&self, query: &TableQuery) -> Result<DataTable<DistributorProfile>, AppError> {
        let (distributors, records_total) = self
            .distributor_repo
            .list_page(query.limit(), query.offset())
            .await?;
        let mut data = Vec::with_capacity(distributors.len());
        for distributor in distributors {
            data.push(self.distributor_service.with_address(distributor).await?);
        }
        Ok(DataTable { records_total, data })
    }

    pub async fn items(&self, query: &TableQuery) -> Result<DataTable<ItemSummary>, AppError> {
        let (items, records_total) = self.item_repo.list_page(None, query.limit(), query.offset()).await?;
        let mut data = Vec::with_capacity(items.len());
        for item in items {
            data.push(self.item_service.view(item).summary().await?);
        }
        Ok(DataTable { records_total, data })
    }
}
