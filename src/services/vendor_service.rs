// src/services/vendor_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AddressRepository, AreaRepository, UserRepository, VendorRepository},
    models::{
        address::AddressOwner,
        auth::{AuthResponse, Role},
        vendor::{Vendor, VendorDetailsPayload, VendorProfile},
        workflow::VerifiedContact,
    },
    services::{
        area_service::{self, AreaService},
        auth::{AuthService, hash_password},
    },
};

#[derive(Clone)]
pub struct VendorService {
    pool: PgPool,
    vendor_repo: VendorRepository,
    user_repo: UserRepository,
    address_repo: AddressRepository,
    area_repo: AreaRepository,
    area_service: AreaService,
    auth_service: AuthService,
}

impl VendorService {
    pub fn new(
        pool: PgPool,
        vendor_repo: VendorRepository,
        user_repo: UserRepository,
        address_repo: AddressRepository,
        area_repo: AreaRepository,
        area_service: AreaService,
        auth_service: AuthService,
    ) -> Self {
        Self {
            pool,
            vendor_repo,
            user_repo,
            address_repo,
            area_repo,
            area_service,
            auth_service,
        }
    }

    /// Final step of vendor registration. The vendor waits for review afterwards.
    pub async fn register(
        &self,
        contact: &VerifiedContact,
        details: &VendorDetailsPayload,
    ) -> Result<AuthResponse, AppError> {
        let mobile = contact.mobile().ok_or(AppError::InvalidCredentials)?;
        if self.user_repo.mobile_taken(mobile).await? {
            return Err(AppError::MobileAlreadyExists);
        }
        area_service::require_leaf(&self.area_repo, details.address.cn_id).await?;

        let password_hash = hash_password(&details.password).await?;

        let mut tx = self.pool.begin().await?;
        let vendor = self
            .vendor_repo
            .create(&mut *tx, mobile, &password_hash, details)
            .await?;
        self.address_repo
            .upsert(&mut *tx, AddressOwner::Vendor, vendor.id, &details.address)
            .await?;
        tx.commit().await?;

        tracing::info!(vendor_id = vendor.id, brand = %vendor.brand, "vendor registered, awaiting review");
        self.auth_service.respond(vendor.id, Role::Vendor)
    }

    pub async fn profile(&self, vendor_id: i32) -> Result<VendorProfile, AppError> {
        let vendor = self
            .vendor_repo
            .find_by_id(vendor_id)
            .await?
            .ok_or(AppError::NotFound("vendor"))?;
        self.with_address(vendor).await
    }

    pub async fn with_address(&self, vendor: Vendor) -> Result<VendorProfile, AppError> {
        let address = self.area_service.address_of(AddressOwner::Vendor, vendor.id).await?;
        Ok(VendorProfile { vendor, address })
    }

    pub async fn pending(&self) -> Result<Vec<VendorProfile>, AppError> {
        let mut profiles = Vec::new();
        for vendor in self.vendor_repo.list_pending().await? {
            profiles.push(self.with_address(vendor).await?);
        }
        Ok(profiles)
    }

    pub async fn confirm(&self, vendor_id: i32) -> Result<(), AppError> {
        if !self.vendor_repo.review(vendor_id, true, None).await? {
            return Err(AppError::NotFound("pending vendor"));
        }
        tracing::info!(vendor_id, "vendor confirmed");
        Ok(())
    }

    pub async fn reject(&self, vendor_id: i32, message: &str) -> Result<(), AppError> {
        if !self.vendor_repo.review(vendor_id, false, Some(message)).await? {
            return Err(AppError::NotFound("pending vendor"));
        }
        tracing::info!(vendor_id, "vendor rejected");
        Ok(())
    }
}
