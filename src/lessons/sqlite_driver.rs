//! Raw SQLite through `sqlx`, without the ORM in between.
//!
//! Statements are plain strings with `?` and `?NNN` placeholders, executed on
//! an explicit transaction that is committed at the end.

use crate::{
    config::settings::{AppConfig, DEFAULT_DATABASE_URL},
    errors::Result,
    lessons::LessonContext,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, sqlite::SqlitePoolOptions};
use tracing::{debug, info};

const PEOPLE: [(&str, i64); 3] = [("Max", 66), ("Sam", 24), ("Jerome", 33)];

/// One `people` row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Person {
    /// Primary key
    pub id: i64,
    /// Name
    pub name: String,
    /// Age in years
    pub age: i64,
}

/// What the lesson read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOutcome {
    /// Rows older than 30 before the update
    pub older_than_30: Vec<Person>,
    /// Every row after the update
    pub all: Vec<Person>,
}

/// The configured URL when it points at SQLite, an in-memory database otherwise.
#[must_use]
pub fn sqlite_url(config: &AppConfig) -> &str {
    if config.database_url.starts_with("sqlite:") {
        &config.database_url
    } else {
        DEFAULT_DATABASE_URL
    }
}

/// Opens a single-connection pool.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await?;
    info!(url, "Connected to SQLite");
    Ok(pool)
}

fn print_people(people: &[Person]) {
    for Person { id, name, age } in people {
        println!("({id}) Name: {name} is {age} years old.");
    }
}

/// Create, clear, insert, select, update, select, commit.
pub async fn run_statements(pool: &SqlitePool) -> Result<SqliteOutcome> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS people (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER)",
    )
    .execute(&mut *tx)
    .await?;
    let cleared = sqlx::query("DELETE FROM people").execute(&mut *tx).await?;
    debug!(rows = cleared.rows_affected(), "Cleared people");
    tx.commit().await?;

    let mut tx = pool.begin().await?;
    println!("****** Insert rows ******");
    let mut insert: QueryBuilder<'_, Sqlite> = QueryBuilder::new("INSERT INTO people (name, age) ");
    insert.push_values(PEOPLE, |mut row, (name, age)| {
        row.push_bind(name).push_bind(age);
    });
    let inserted = insert.build().execute(&mut *tx).await?;
    debug!(rows = inserted.rows_affected(), "Inserted people");

    println!("****** Select with a positional bind ******");
    let older_than_30: Vec<Person> =
        sqlx::query_as("SELECT id, name, age FROM people WHERE age > ? ORDER BY id")
            .bind(30_i64)
            .fetch_all(&mut *tx)
            .await?;
    print_people(&older_than_30);

    println!("****** Update with numbered binds ******");
    sqlx::query("UPDATE people SET age = ?1, name = ?2 WHERE name = ?3")
        .bind(19_i64)
        .bind("Maxine")
        .bind("Max")
        .execute(&mut *tx)
        .await?;

    println!("****** Select everything ******");
    let all: Vec<Person> = sqlx::query_as("SELECT id, name, age FROM people ORDER BY id")
        .fetch_all(&mut *tx)
        .await?;
    print_people(&all);

    tx.commit().await?;
    Ok(SqliteOutcome { older_than_30, all })
}

/// Runs the raw driver walkthrough against SQLite.
pub async fn run(ctx: &LessonContext) -> Result<()> {
    let pool = connect(sqlite_url(&ctx.config)).await?;
    let outcome = run_statements(&pool).await?;
    info!(rows = outcome.all.len(), "SQLite driver lesson done");
    pool.close().await;
    Ok(())
}
