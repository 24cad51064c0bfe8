pub mod area_service;
pub mod auth;
pub mod captcha_service;
pub mod dashboard_service;
pub mod distributor_service;
pub mod item_service;
pub mod user_service;
pub mod vendor_service;
pub mod workflow_service;
