/// Application settings loaded from config.toml and environment overrides
pub mod app;

/// Catalog products seeded from config.toml
pub mod catalog;

/// Database configuration and connection management
pub mod database;

/// Admin user ids configured through the environment
pub mod users;

pub use app::{AppConfig, PaymentsConfig, ServerConfig, load_app_configuration};
