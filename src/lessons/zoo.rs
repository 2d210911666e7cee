//! The zoo schema used by the metadata and join lessons.
//!
//! `species` and `animal` are linked by a foreign key; `menu` names a species
//! in its `animal` column without any constraint, so it can be joined both
//! on matching and on missing rows. `visitor` only exists to show every
//! column type once.

use crate::{
    config::seed::SeedData,
    core::{Column, ColumnKind, MetaData, OnDelete, TableDef, to_statement},
    errors::Result,
};
use sea_orm::{
    ConnectionTrait,
    sea_query::{Alias, InsertStatement, Query},
};
use tracing::debug;

/// `species(id, description)`
#[must_use]
pub fn species_table() -> TableDef {
    TableDef::new("species")
        .column(Column::new("id", ColumnKind::String(Some(100))).primary_key())
        .column(Column::new("description", ColumnKind::Text))
}

/// `animal(id, gender, name, species, birthday, price)`
#[must_use]
pub fn animal_table() -> TableDef {
    TableDef::new("animal")
        .column(Column::new("id", ColumnKind::Integer).primary_key())
        .column(
            Column::new("gender", ColumnKind::enumeration("gender", &["male", "female"]))
                .not_null(),
        )
        .column(Column::new("name", ColumnKind::String(Some(100))).not_null())
        .column(
            Column::new("species", ColumnKind::String(Some(100)))
                .not_null()
                .references("species", "id")
                .on_delete(OnDelete::Cascade),
        )
        .column(Column::new("birthday", ColumnKind::DateTime))
        .column(Column::new("price", ColumnKind::Decimal(10, 2)))
}

/// `menu(id, animal, menu, price)`; `animal` is a plain string.
#[must_use]
pub fn menu_table() -> TableDef {
    TableDef::new("menu")
        .column(
            Column::new("id", ColumnKind::Integer)
                .primary_key()
                .auto_increment(),
        )
        .column(Column::new("animal", ColumnKind::String(Some(100))).not_null())
        .column(Column::new("menu", ColumnKind::String(Some(100))).not_null())
        .column(Column::new("price", ColumnKind::Float))
}

/// A table with one column of every supported type.
#[must_use]
pub fn visitor_table() -> TableDef {
    TableDef::new("visitor")
        .column(Column::new("id", ColumnKind::BigInteger).primary_key())
        .column(Column::new("nickname", ColumnKind::String(None)))
        .column(Column::new("bio", ColumnKind::Text))
        .column(Column::new("age", ColumnKind::Integer))
        .column(Column::new("member", ColumnKind::Boolean).not_null())
        .column(Column::new(
            "ticket",
            ColumnKind::enumeration("ticket", &["child", "adult", "senior"]),
        ))
        .column(Column::new("visited_on", ColumnKind::Date))
        .column(Column::new("checked_in", ColumnKind::DateTime))
        .column(Column::new("photo", ColumnKind::Blob))
        .column(Column::new("spent", ColumnKind::Decimal(8, 2)))
        .column(Column::new("rating", ColumnKind::Float))
        .column(Column::new("preferences", ColumnKind::Json))
        .column(
            Column::new("favourite_species", ColumnKind::String(Some(100)))
                .references("species", "id")
                .on_delete(OnDelete::SetNull),
        )
}

/// All four zoo tables, registered child-first so sorting has work to do.
#[must_use]
pub fn zoo_metadata() -> MetaData {
    let mut metadata = MetaData::new();
    metadata.add(visitor_table());
    metadata.add(animal_table());
    metadata.add(menu_table());
    metadata.add(species_table());
    metadata
}

fn insert_species(seed: &SeedData) -> InsertStatement {
    let mut insert = Query::insert();
    insert
        .into_table(Alias::new("species"))
        .columns([Alias::new("id"), Alias::new("description")]);
    for species in &seed.species {
        insert.values_panic([species.id.clone().into(), species.description.clone().into()]);
    }
    insert
}

fn insert_animals(seed: &SeedData) -> Result<InsertStatement> {
    let mut insert = Query::insert();
    insert.into_table(Alias::new("animal")).columns(
        ["id", "gender", "name", "species", "birthday", "price"].map(Alias::new),
    );
    for animal in &seed.animals {
        insert.values_panic([
            animal.id.into(),
            animal.gender.clone().into(),
            animal.name.clone().into(),
            animal.species.clone().into(),
            animal.birthday()?.into(),
            animal.price.into(),
        ]);
    }
    Ok(insert)
}

fn insert_menus(seed: &SeedData) -> InsertStatement {
    let mut insert = Query::insert();
    insert
        .into_table(Alias::new("menu"))
        .columns(["animal", "menu", "price"].map(Alias::new));
    for menu in &seed.menus {
        insert.values_panic([
            menu.animal.clone().into(),
            menu.menu.clone().into(),
            menu.price.into(),
        ]);
    }
    insert
}

async fn run_insert<C: ConnectionTrait>(conn: &C, insert: &InsertStatement) -> Result<u64> {
    let result = conn
        .execute(to_statement(conn.get_database_backend(), insert))
        .await?;
    Ok(result.rows_affected())
}

/// Fills `species` and `animal` with the seed rows. Empty seed sections are
/// skipped.
pub async fn load_animals<C: ConnectionTrait>(conn: &C, seed: &SeedData) -> Result<()> {
    if !seed.species.is_empty() {
        let count = run_insert(conn, &insert_species(seed)).await?;
        debug!(count, "Loaded species");
    }
    if !seed.animals.is_empty() {
        let count = run_insert(conn, &insert_animals(seed)?).await?;
        debug!(count, "Loaded animals");
    }
    Ok(())
}

/// Fills `menu` with the seed rows.
pub async fn load_menus<C: ConnectionTrait>(conn: &C, seed: &SeedData) -> Result<()> {
    if !seed.menus.is_empty() {
        let count = run_insert(conn, &insert_menus(seed)).await?;
        debug!(count, "Loaded menus");
    }
    Ok(())
}

/// Drops and recreates the zoo tables, then loads the seed rows.
pub async fn setup_zoo<C: ConnectionTrait>(conn: &C, seed: &SeedData) -> Result<MetaData> {
    let metadata = zoo_metadata();
    metadata.drop_all(conn, true).await?;
    metadata.create_all(conn, false).await?;
    load_animals(conn, seed).await?;
    load_menus(conn, seed).await?;
    Ok(metadata)
}
