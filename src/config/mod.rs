/// Database configuration and connection management
pub mod database;

/// Store settings loading from config.toml
pub mod settings;

/// Administrator bootstrap from environment variables
pub mod admin;
