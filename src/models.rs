pub mod address;
pub mod admin;
pub mod area;
pub mod auth;
pub mod collection;
pub mod distributor;
pub mod item;
pub mod vendor;
pub mod workflow;
