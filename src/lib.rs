pub mod auth;
pub mod config;
pub mod logging;
pub mod protocol;
pub mod store;
pub mod strategy;
