/// Catalog seed loading from catalog.toml
pub mod catalog;

/// Database connection and table creation
pub mod database;

/// Environment-driven application settings
pub mod settings;

pub use settings::AppConfig;
