// src/services/distributor_service.rs
//
// Every write that moves or removes a distributor recomputes the affected
// city counters inside the same transaction.

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AddressRepository, AreaRepository, DistributorRepository, PgUnitOfWork, VendorRepository},
    models::{
        address::{AddressOwner, AddressPayload},
        distributor::{
            CreateDistributorPayload, Distributor, DistributorProfile, DistributorRevocation,
        },
    },
    services::{
        area_service::{self, AreaService},
        auth::hash_password,
    },
};

#[derive(Clone)]
pub struct DistributorService {
    pool: PgPool,
    distributor_repo: DistributorRepository,
    vendor_repo: VendorRepository,
    address_repo: AddressRepository,
    area_repo: AreaRepository,
    area_service: AreaService,
}

impl DistributorService {
    pub fn new(
        pool: PgPool,
        distributor_repo: DistributorRepository,
        vendor_repo: VendorRepository,
        address_repo: AddressRepository,
        area_repo: AreaRepository,
        area_service: AreaService,
    ) -> Self {
        Self {
            pool,
            distributor_repo,
            vendor_repo,
            address_repo,
            area_repo,
            area_service,
        }
    }

    async fn begin(&self) -> Result<PgUnitOfWork, AppError> {
        PgUnitOfWork::begin(&self.pool, self.area_repo.clone(), self.distributor_repo.clone()).await
    }

    pub async fn create(
        &self,
        vendor_id: i32,
        payload: &CreateDistributorPayload,
    ) -> Result<DistributorProfile, AppError> {
        let vendor = self
            .vendor_repo
            .find_by_id(vendor_id)
            .await?
            .ok_or(AppError::NotFound("vendor"))?;
        if !vendor.confirmed {
            return Err(AppError::Forbidden);
        }
        area_service::require_leaf(&self.area_repo, payload.address.cn_id).await?;
        let password_hash = hash_password(&payload.password).await?;

        let uow = self.begin().await?;
        let distributor = {
            let mut tx = uow.lock().await;
            let distributor = self
                .distributor_repo
                .create(
                    &mut **tx,
                    vendor_id,
                    &payload.username,
                    &password_hash,
                    &payload.name,
                    &payload.contact,
                    &payload.contact_mobile,
                    &payload.contact_telephone,
                )
                .await?;
            self.address_repo
                .upsert(&mut **tx, AddressOwner::Distributor, distributor.id, &payload.address)
                .await?;
            distributor
        };
        area_service::update_distributor_amount(&uow, payload.address.cn_id).await?;
        uow.commit().await?;

        tracing::info!(distributor_id = distributor.id, vendor_id, "distributor created");
        self.with_address(distributor).await
    }

    pub async fn update_address(
        &self,
        vendor_id: i32,
        distributor_id: i32,
        payload: &AddressPayload,
    ) -> Result<DistributorProfile, AppError> {
        let distributor = self.owned(vendor_id, distributor_id).await?;
        area_service::require_leaf(&self.area_repo, payload.cn_id).await?;

        let uow = self.begin().await?;
        let previous = {
            let mut tx = uow.lock().await;
            let previous = self
                .address_repo
                .find_with(&mut **tx, AddressOwner::Distributor, distributor.id)
                .await?;
            self.address_repo
                .upsert(&mut **tx, AddressOwner::Distributor, distributor.id, payload)
                .await?;
            previous
        };
        // Both the city left behind and the new one.
        if let Some(previous) = previous {
            area_service::update_distributor_amount(&uow, previous.cn_id).await?;
        }
        area_service::update_distributor_amount(&uow, payload.cn_id).await?;
        uow.commit().await?;

        tracing::info!(distributor_id, "distributor address updated");
        self.with_address(distributor).await
    }

    pub async fn request_revocation(
        &self,
        vendor_id: i32,
        distributor_id: i32,
        contract: &str,
    ) -> Result<DistributorRevocation, AppError> {
        let distributor = self.owned(vendor_id, distributor_id).await?;
        if distributor.is_revoked {
            return Err(AppError::Conflict("This distributor is already revoked.".into()));
        }
        if self.distributor_repo.has_pending_revocation(distributor.id).await? {
            return Err(AppError::Conflict("A revocation request is already pending.".into()));
        }
        let revocation = self
            .distributor_repo
            .create_revocation(&self.pool, distributor.id, contract)
            .await?;
        tracing::info!(distributor_id, revocation_id = revocation.id, "revocation requested");
        Ok(revocation)
    }

    /// Admin approval: revoke, close the request and recompute the counter.
    pub async fn approve_revocation(&self, revocation_id: i32) -> Result<(), AppError> {
        let uow = self.begin().await?;
        let address = {
            let mut tx = uow.lock().await;
            let revocation = self
                .distributor_repo
                .find_revocation(&mut **tx, revocation_id)
                .await?
                .filter(|r| r.pending)
                .ok_or(AppError::NotFound("pending revocation"))?;
            self.distributor_repo
                .mark_revoked(&mut **tx, revocation.distributor_id)
                .await?;
            self.distributor_repo.close_revocation(&mut **tx, revocation.id).await?;
            self.address_repo
                .find_with(&mut **tx, AddressOwner::Distributor, revocation.distributor_id)
                .await?
        };
        if let Some(address) = address {
            area_service::update_distributor_amount(&uow, address.cn_id).await?;
        }
        uow.commit().await?;

        tracing::info!(revocation_id, "distributor revoked");
        Ok(())
    }

    pub async fn pending_revocations(&self) -> Result<Vec<DistributorRevocation>, AppError> {
        self.distributor_repo.list_pending_revocations().await
    }

    pub async fn list_for_vendor(&self, vendor_id: i32) -> Result<Vec<DistributorProfile>, AppError> {
        let mut profiles = Vec::new();
        for distributor in self.distributor_repo.list_by_vendor(vendor_id).await? {
            profiles.push(self.with_address(distributor).await?);
        }
        Ok(profiles)
    }

    pub async fn profile(&self, distributor_id: i32) -> Result<DistributorProfile, AppError> {
        let distributor = self
            .distributor_repo
            .find_by_id(&self.pool, distributor_id)
            .await?
            .ok_or(AppError::NotFound("distributor"))?;
        self.with_address(distributor).await
    }

    pub async fn with_address(&self, distributor: Distributor) -> Result<DistributorProfile, AppError> {
        let address = self
            .area_service
            .address_of(AddressOwner::Distributor, distributor.id)
            .await?;
        Ok(DistributorProfile { distributor, address })
    }

    async fn owned(&self, vendor_id: i32, distributor_id: i32) -> Result<Distributor, AppError> {
        self.distributor_repo
            .find_by_id(&self.pool, distributor_id)
            .await?
            .filter(|d| d.vendor_id == vendor_id)
            .ok_or(AppError::NotFound("distributor"))
    }
}
