pub mod admin;
pub mod areas;
pub mod auth;
pub mod captcha;
pub mod distributors;
pub mod items;
pub mod steps;
pub mod users;
pub mod vendors;
