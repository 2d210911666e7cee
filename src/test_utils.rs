//! Shared test utilities.
//!
//! This module provides helpers for setting up in-memory databases and
//! creating test rows with sensible defaults.

use crate::{
    config::{database, seed::SeedData, settings::AppConfig},
    entities::user,
    errors::Result,
};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database without any tables.
pub async fn setup_empty_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Ok(db)
}

/// Creates an in-memory `SQLite` database with all entity tables initialized.
/// This is the standard setup for ORM tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = setup_empty_db().await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Settings pointing at a private in-memory database.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig::default()
}

/// The embedded seed data.
pub fn test_seed() -> Result<SeedData> {
    crate::config::seed::load_seed(None)
}

/// Inserts a user.
pub async fn create_test_user(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
    age: i32,
) -> Result<user::Model> {
    let model = user::ActiveModel {
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        age: Set(age),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}
