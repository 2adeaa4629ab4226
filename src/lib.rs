pub mod api;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod extractor;
pub mod forwarder;
pub mod logger;
pub mod types;
pub mod utils;
