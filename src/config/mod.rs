/// Engine creation and ORM table setup
pub mod database;

/// Seed rows for the example schemas, loaded from TOML
pub mod seed;

/// Application settings from config.toml, environment and CLI
pub mod settings;
