pub mod kv;
pub mod strategies;
