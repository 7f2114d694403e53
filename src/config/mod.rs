/// Application settings read from the environment
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Template seed loading from config.toml
pub mod templates;
