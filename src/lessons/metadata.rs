//! Metadata - tables described in code, created, reflected back and dropped.

use crate::{
    core::{MetaData, TableDef, inspect, print_table},
    errors::{Error, Result},
    lessons::{
        LessonContext,
        zoo::{self, animal_table, species_table, visitor_table},
    },
};
use sea_orm::ConnectionTrait;
use tracing::{info, warn};

fn describe_columns(table: &TableDef) {
    println!("columns of {}:", table.name);
    for column in &table.columns {
        let mut notes = Vec::new();
        if column.primary_key {
            notes.push("primary key".to_string());
        }
        if !column.nullable {
            notes.push("not null".to_string());
        }
        if let Some(reference) = &column.references {
            notes.push(format!("-> {}.{}", reference.table, reference.column));
        }
        println!(
            "  {}.{}: {} {}",
            table.name,
            column.name,
            column.kind.sql_type(),
            notes.join(", ")
        );
    }
}

async fn print_inspected_columns<C: ConnectionTrait>(conn: &C, table: &str) -> Result<()> {
    println!("inspector columns of {table}:");
    for column in inspect::get_columns(conn, table).await? {
        println!(
            "  name={} type={} nullable={} default={:?} primary_key={}",
            column.name, column.data_type, column.nullable, column.default, column.primary_key
        );
    }
    for fk in inspect::get_foreign_keys(conn, table).await? {
        println!(
            "  foreign key {} -> {}.{}",
            fk.column, fk.referred_table, fk.referred_column
        );
    }
    Ok(())
}

/// Builds the zoo tables, reflects them back, then drops and recreates them.
pub async fn run(ctx: &LessonContext) -> Result<()> {
    let db = ctx.connect().await?;

    println!("**** Table metadata ****");
    let mut metadata = MetaData::new();
    metadata.add(species_table());
    metadata.add(animal_table());
    for table in metadata.sorted_tables() {
        describe_columns(table);
    }

    println!("**** create_all and load ****");
    metadata.drop_all(&db, true).await?;
    metadata.create_all(&db, false).await?;
    zoo::load_animals(&db, &ctx.seed).await?;
    print_table(&db, "species").await?;
    print_table(&db, "animal").await?;

    println!("**** Reflection ****");
    let reflected = MetaData::reflect(&db).await?;
    println!("reflected tables: {}", reflected.table_names().join(", "));
    print_inspected_columns(&db, "animal").await?;
    let species = reflected
        .table("species")
        .ok_or_else(|| Error::TableNotFound {
            name: "species".to_string(),
        })?;
    describe_columns(species);

    let mut single = MetaData::new();
    let animal = single.reflect_table(&db, "animal").await?;
    info!(columns = animal.columns.len(), "Reflected animal on its own");
    if let Err(e) = single.reflect_table(&db, "unicorn").await {
        println!("reflecting a missing table: {e}");
    }

    println!("**** Every column type ****");
    let visitor = visitor_table();
    describe_columns(&visitor);
    println!("{};", visitor.create_sql(db.get_database_backend()));
    metadata.add(visitor);

    println!("**** Dropping and recreating ****");
    // children before parents, no IF EXISTS
    if let Some(table) = metadata.table("animal") {
        table.drop_table(&db, false).await?;
    }
    if let Some(table) = metadata.table("species") {
        table.drop_table(&db, false).await?;
    }
    println!("tables left: {:?}", inspect::table_names(&db).await?);

    // species and animal are gone already, visitor was never created
    metadata.drop_all(&db, true).await?;
    metadata.create_all(&db, true).await?;
    metadata.create_all(&db, true).await?;
    for name in ["species", "animal", "visitor"] {
        print_table(&db, name).await?;
    }

    metadata.drop_all(&db, false).await?;
    match metadata.drop_all(&db, false).await {
        Err(e) => println!("dropping twice without checkfirst: {e}"),
        Ok(()) => warn!("Second drop_all unexpectedly succeeded"),
    }
    Ok(())
}
