pub mod address_repo;
pub use address_repo::AddressRepository;
pub mod area_repo;
pub use area_repo::{AreaRepository, AreaStore};
pub mod attribute_repo;
pub use attribute_repo::{AttributeLookup, AttributeRepository};
pub mod collection_repo;
pub use collection_repo::CollectionRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod distributor_repo;
pub use distributor_repo::{DistributorCensus, DistributorRepository};
pub mod item_repo;
pub use item_repo::ItemRepository;
pub mod privilege_repo;
pub use privilege_repo::PrivilegeRepository;
pub mod session_store;
pub use session_store::{CaptchaStore, WorkflowStore};
pub mod unit_of_work;
pub use unit_of_work::PgUnitOfWork;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod vendor_repo;
pub use vendor_repo::VendorRepository;
