//! Database configuration module - engine creation and ORM table setup.
//!
//! An "engine" here is a sea-orm [`DatabaseConnection`]: a configured pool
//! for one database URL. Tables for the ORM entities are generated with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! struct definitions without handwritten DDL.

use crate::{
    config::settings::AppConfig,
    entities::{Address, Animal, Customer, Product, Purchase, Shop, Species, User},
    errors::Result,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::Table,
};
use tracing::{debug, info, instrument};

/// Creates an engine from the configured URL.
///
/// URLs follow `<dialect>://<username>:<password>@<host>:<port>/<db_name>`;
/// `sqlite::memory:` gives a private in-memory database.
#[instrument(skip(config), fields(url = %config.database_url))]
pub async fn create_connection(config: &AppConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(1)
        .sqlx_logging(config.echo);

    let db = Database::connect(options).await?;
    info!(backend = ?db.get_database_backend(), "Engine created");
    Ok(db)
}

async fn create_entity_table<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    debug!(table = entity.table_name(), "Ensured table");
    Ok(())
}

async fn drop_entity_table<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let stmt = Table::drop().table(entity).if_exists().to_owned();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates the tables of every ORM entity, parents before children.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    create_entity_table(db, User).await?;
    create_entity_table(db, Address).await?;
    create_entity_table(db, Species).await?;
    create_entity_table(db, Animal).await?;
    create_entity_table(db, Shop).await?;
    create_entity_table(db, Customer).await?;
    create_entity_table(db, Product).await?;
    create_entity_table(db, Purchase).await?;
    Ok(())
}

/// Drops the tables of every ORM entity, children before parents.
pub async fn drop_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    drop_entity_table(db, Purchase).await?;
    drop_entity_table(db, Product).await?;
    drop_entity_table(db, Customer).await?;
    drop_entity_table(db, Shop).await?;
    drop_entity_table(db, Animal).await?;
    drop_entity_table(db, Species).await?;
    drop_entity_table(db, Address).await?;
    drop_entity_table(db, User).await?;
    Ok(())
}

/// Starts from a clean slate: drops and recreates every ORM table.
pub async fn reset_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    drop_tables(db).await?;
    create_tables(db).await
}
