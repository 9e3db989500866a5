pub mod api;
pub mod config;
pub mod document;
pub mod excel;
pub mod render;
pub mod reports;
pub mod types;
