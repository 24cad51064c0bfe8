// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{
        AddressRepository, AreaRepository, AttributeRepository, CaptchaStore, CollectionRepository,
        DashboardRepository, DistributorRepository, ItemRepository, PrivilegeRepository,
        UserRepository, VendorRepository, WorkflowStore,
    },
    services::{
        area_service::AreaService,
        auth::AuthService,
        captcha_service::{CaptchaService, TracingNotifier},
        dashboard_service::DashboardService,
        distributor_service::DistributorService,
        item_service::ItemService,
        user_service::UserService,
        vendor_service::VendorService,
        workflow_service::WorkflowService,
    },
};

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub session_ttl: Duration,
    pub captcha_ttl: Duration,
    pub area_seed_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            session_ttl: Duration::from_secs(parse_or("SESSION_TTL_SECS", 1800)?),
            captcha_ttl: Duration::from_secs(parse_or("CAPTCHA_TTL_SECS", 300)?),
            area_seed_path: env::var("AREA_SEED_PATH").ok().map(PathBuf::from),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} is not a valid value")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub area_service: AreaService,
    pub item_service: ItemService,
    pub workflow_service: WorkflowService,
    pub captcha_service: CaptchaService,
    pub user_service: UserService,
    pub vendor_service: VendorService,
    pub distributor_service: DistributorService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("database connection established");

        Ok(Self::from_parts(db_pool, settings))
    }

    /// Wires every repository and service around an existing pool.
    pub fn from_parts(db_pool: PgPool, settings: &Settings) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let vendor_repo = VendorRepository::new(db_pool.clone());
        let distributor_repo = DistributorRepository::new(db_pool.clone());
        let privilege_repo = PrivilegeRepository::new(db_pool.clone());
        let area_repo = AreaRepository::new(db_pool.clone());
        let address_repo = AddressRepository::new(db_pool.clone());
        let attribute_repo = AttributeRepository::new(db_pool.clone());
        let item_repo = ItemRepository::new(db_pool.clone());
        let collection_repo = CollectionRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            vendor_repo.clone(),
            distributor_repo.clone(),
            privilege_repo,
            settings.jwt_secret.clone(),
        );
        let area_service = AreaService::new(
            db_pool.clone(),
            area_repo.clone(),
            address_repo.clone(),
            distributor_repo.clone(),
        );
        let item_service = ItemService::new(
            db_pool.clone(),
            item_repo.clone(),
            vendor_repo.clone(),
            attribute_repo,
        );
        let workflow_service = WorkflowService::new(WorkflowStore::new(settings.session_ttl));
        let captcha_service = CaptchaService::new(
            CaptchaStore::new(settings.captcha_ttl),
            user_repo.clone(),
            Arc::new(TracingNotifier),
        );
        let user_service = UserService::new(
            address_repo.clone(),
            area_repo.clone(),
            collection_repo,
            item_service.clone(),
        );
        let vendor_service = VendorService::new(
            db_pool.clone(),
            vendor_repo.clone(),
            user_repo,
            address_repo.clone(),
            area_repo.clone(),
            area_service.clone(),
            auth_service.clone(),
        );
        let distributor_service = DistributorService::new(
            db_pool.clone(),
            distributor_repo.clone(),
            vendor_repo.clone(),
            address_repo,
            area_repo,
            area_service.clone(),
        );
        let dashboard_service = DashboardService::new(
            dashboard_repo,
            vendor_repo,
            distributor_repo,
            item_repo,
            vendor_service.clone(),
            distributor_service.clone(),
            item_service.clone(),
        );

        Self {
            db_pool,
            auth_service,
            area_service,
            item_service,
            workflow_service,
            captcha_service,
            user_service,
            vendor_service,
            distributor_service,
            dashboard_service,
        }
    }
}
