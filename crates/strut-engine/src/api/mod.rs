pub mod config;
pub mod context;
pub mod events;
pub mod host;
pub mod types;
