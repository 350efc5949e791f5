/// Database configuration and connection management
pub mod database;

/// Process settings from config.toml and environment variables
pub mod settings;

pub use settings::AppConfig;
