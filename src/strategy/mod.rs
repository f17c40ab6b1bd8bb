pub mod allocator;
pub mod draft;
pub mod engine;
pub mod metrics;
pub mod strategy_constants;
pub mod types;
