//! Transactions - when does a write actually stick?
//!
//! Every variant writes into the `person` table and the table is printed
//! afterwards, so the reader can see which rows survived:
//!
//! * explicit `begin` + `commit`: persisted
//! * `begin` and leaving the scope without `commit`: rolled back on drop
//! * closure-scoped `transaction(..)`: committed when the closure returns `Ok`
//! * closure-scoped `transaction(..)` returning `Err`: rolled back
//! * nested `begin` on a transaction: a savepoint that can be undone alone
//! * explicit `rollback`

use crate::{
    core::{print_table, text},
    errors::{Error, Result},
    lessons::LessonContext,
};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, TransactionTrait,
};
use tracing::{debug, info, instrument};

/// A `person` row: fields can be read by name like an object.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct PersonRow {
    /// Primary key
    pub id: i32,
    /// Name
    pub name: String,
    /// Age, unknown for some people
    pub age: Option<i32>,
}

fn create_person_sql(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => "CREATE TABLE person (id SERIAL PRIMARY KEY, name TEXT, age INTEGER)",
        _ => "CREATE TABLE person (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER)",
    }
}

/// (Re)creates an empty `person` table.
pub async fn create_person_table<C: ConnectionTrait>(conn: &C) -> Result<()> {
    conn.execute_unprepared("DROP TABLE IF EXISTS person").await?;
    conn.execute_unprepared(create_person_sql(conn.get_database_backend()))
        .await?;
    Ok(())
}

/// Inserts one person with textual SQL and named binds.
pub async fn insert_person<C: ConnectionTrait>(conn: &C, name: &str, age: Option<i32>) -> Result<()> {
    text("INSERT INTO person (name, age) VALUES (:name, :age)")
        .bind("name", name)
        .bind("age", age)
        .execute(conn)
        .await?;
    debug!(name, "Inserted person");
    Ok(())
}

/// Looks a person up by name.
pub async fn find_person<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Option<PersonRow>> {
    let row = text("SELECT id, name, age FROM person WHERE name = :name")
        .bind("name", name)
        .fetch_one(conn)
        .await?;
    row.map(|row| PersonRow::from_query_result(&row, "").map_err(Into::into))
        .transpose()
}

/// All names in insertion order.
pub async fn person_names<C: ConnectionTrait>(conn: &C) -> Result<Vec<String>> {
    text("SELECT name FROM person ORDER BY id")
        .fetch_all(conn)
        .await?
        .iter()
        .map(|row| row.try_get::<String>("", "name").map_err(Into::into))
        .collect()
}

/// `begin` ... `commit`: the row is persisted.
#[instrument(skip(db))]
pub async fn insert_and_commit(db: &DatabaseConnection, name: &str, age: i32) -> Result<()> {
    let txn = db.begin().await?;
    insert_person(&txn, name, Some(age)).await?;
    txn.commit().await?;
    Ok(())
}

/// `begin` without `commit`: dropping the transaction rolls it back.
#[instrument(skip(db))]
pub async fn insert_without_commit(db: &DatabaseConnection, name: &str, age: i32) -> Result<()> {
    let txn = db.begin().await?;
    insert_person(&txn, name, Some(age)).await?;
    drop(txn);
    Ok(())
}

/// Closure-scoped transaction: commits when the closure succeeds.
#[instrument(skip(db))]
pub async fn insert_in_block(db: &DatabaseConnection, name: &str, age: i32) -> Result<()> {
    let name = name.to_string();
    db.transaction::<_, (), Error>(move |txn| {
        Box::pin(async move { insert_person(txn, &name, Some(age)).await })
    })
    .await?;
    Ok(())
}

/// Closure-scoped transaction that fails after writing: everything is rolled back
/// and the closure's error comes back to the caller.
#[instrument(skip(db))]
pub async fn insert_then_fail(db: &DatabaseConnection, name: &str, age: i32) -> Result<()> {
    let name = name.to_string();
    db.transaction::<_, (), Error>(move |txn| {
        Box::pin(async move {
            insert_person(txn, &name, Some(age)).await?;
            Err(Error::Aborted {
                reason: format!("changed our mind about {name}"),
            })
        })
    })
    .await?;
    Ok(())
}

/// Savepoint inside an outer transaction. `kept` is committed with the outer
/// transaction, `undone` is rolled back with the savepoint.
#[instrument(skip(db))]
pub async fn savepoint_rollback(db: &DatabaseConnection, kept: &str, undone: &str) -> Result<()> {
    let outer = db.begin().await?;
    insert_person(&outer, kept, None).await?;

    let inner = outer.begin().await?;
    insert_person(&inner, undone, None).await?;
    inner.rollback().await?;

    outer.commit().await?;
    Ok(())
}

/// `begin` ... `rollback`.
#[instrument(skip(db))]
pub async fn insert_and_rollback(db: &DatabaseConnection, name: &str, age: i32) -> Result<()> {
    let txn = db.begin().await?;
    insert_person(&txn, name, Some(age)).await?;
    txn.rollback().await?;
    Ok(())
}

async fn show_row_access(db: &DatabaseConnection) -> Result<()> {
    let Some(row) = text("SELECT id, name, age FROM person WHERE name = :name")
        .bind("name", "Maxine")
        .fetch_one(db)
        .await?
    else {
        return Err(Error::NoResultFound {
            entity: "person".to_string(),
        });
    };

    // by column name, by position, and as a typed struct
    let id: i32 = row.try_get("", "id")?;
    let name: String = row.try_get_by_index(1)?;
    let person = PersonRow::from_query_result(&row, "")?;
    println!("row: {person:?}, id: {id}, name: {name}, age: {:?}", person.age);

    let PersonRow { id, name, age } = person;
    println!("destructured: id={id} name={name} age={age:?}");
    Ok(())
}

/// Walks through every transaction style against a fresh `person` table.
pub async fn run(ctx: &LessonContext) -> Result<()> {
    println!("* Creating engine from a URL: <dialect>://<username>:<password>@<host>:<port>/<db_name>");
    let db = ctx.connect().await?;
    info!(backend = ?db.get_database_backend(), "Connected");

    create_person_table(&db).await?;
    // outside an explicit transaction every statement commits on its own
    insert_person(&db, "Maxine", None).await?;
    show_row_access(&db).await?;

    println!("**** DML: begin + commit: explicit commit persists the row ****");
    insert_and_commit(&db, "Wolverine", 65).await?;
    print_table(&db, "person").await?;

    println!("**** DML: begin without commit: rolled back when the transaction is dropped ****");
    insert_without_commit(&db, "Cyclops", 33).await?;
    print_table(&db, "person").await?;

    println!("**** DML: transaction block: committed when the block succeeds ****");
    insert_in_block(&db, "Professor X", 83).await?;
    print_table(&db, "person").await?;

    println!("**** DML: transaction block that fails: rolled back, error returned ****");
    match insert_then_fail(&db, "Mystique", 40).await {
        Err(e) => println!("caught: {e}"),
        Ok(()) => println!("unexpectedly committed"),
    }
    print_table(&db, "person").await?;

    println!("**** DML: savepoint rolled back inside a committed transaction ****");
    savepoint_rollback(&db, "Storm", "Sabretooth").await?;
    print_table(&db, "person").await?;

    println!("**** DML: explicit rollback ****");
    insert_and_rollback(&db, "Rogue", 22).await?;
    insert_in_block(&db, "Magneto", 22).await?;
    print_table(&db, "person").await?;

    let names = person_names(&db).await?;
    println!("All names in person table: {}", names.join(", "));
    Ok(())
}
