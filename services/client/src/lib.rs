pub mod adapters;
pub mod config;
pub mod context;
pub mod error;
