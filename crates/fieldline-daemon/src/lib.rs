pub mod api;
pub mod config;
pub mod fixtures;
pub mod store;
