pub mod api_client;
pub mod api_types;
pub mod registry;
pub mod types;
