//! Raw PostgreSQL through `sqlx`: `serial` keys and `$n` placeholders.
//!
//! Needs `POSTGRES_URL` (or `postgres_url` in `config.toml`); without one the
//! lesson is skipped.

use crate::{errors::Result, lessons::LessonContext};
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgPoolOptions};
use tracing::{debug, info, warn};

const PETS: [(&str, &str, i32); 5] = [
    ("Max", "dog", 6),
    ("Sam", "cat", 11),
    ("Jerome", "dog", 22),
    ("Yuna", "cat", 13),
    ("Vlad", "cat", 4),
];

/// One `pets` row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Pet {
    /// `serial` primary key
    pub id: i32,
    /// Name
    pub name: String,
    /// `"dog"` or `"cat"`
    pub species: String,
    /// Age in years
    pub age: i32,
}

/// What the lesson read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresOutcome {
    /// Pets of the selected species before the update
    pub selected: Vec<Pet>,
    /// Every pet after the update
    pub all: Vec<Pet>,
}

/// Opens a small pool.
pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new().max_connections(2).connect(url).await?;
    info!("Connected to PostgreSQL");
    Ok(pool)
}

fn print_pets(pets: &[Pet]) {
    for pet in pets {
        println!(
            "({}) Species: {},  Name: {}, age: {}",
            pet.id, pet.species, pet.name, pet.age
        );
    }
}

/// Create, clear, insert, select `species`, age those pets by 100, select, commit.
pub async fn run_statements(pool: &PgPool, species: &str) -> Result<PostgresOutcome> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS pets (id SERIAL PRIMARY KEY, name TEXT, species TEXT, age INTEGER)",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM pets").execute(&mut *tx).await?;
    tx.commit().await?;

    let mut tx = pool.begin().await?;
    println!("****** Insert rows ******");
    let mut insert: QueryBuilder<'_, Postgres> =
        QueryBuilder::new("INSERT INTO pets (name, species, age) ");
    insert.push_values(PETS, |mut row, (name, species, age)| {
        row.push_bind(name).push_bind(species).push_bind(age);
    });
    insert.build().execute(&mut *tx).await?;

    println!("****** Select ******");
    let selected: Vec<Pet> =
        sqlx::query_as("SELECT id, name, species, age FROM pets WHERE species = $1 ORDER BY id")
            .bind(species)
            .fetch_all(&mut *tx)
            .await?;
    print_pets(&selected);

    println!("****** Update ******");
    for pet in &selected {
        sqlx::query("UPDATE pets SET age = $1 WHERE id = $2")
            .bind(pet.age + 100)
            .bind(pet.id)
            .execute(&mut *tx)
            .await?;
    }
    debug!(updated = selected.len(), "Aged pets");

    println!("****** Select everything ******");
    let all: Vec<Pet> = sqlx::query_as("SELECT id, name, species, age FROM pets ORDER BY id")
        .fetch_all(&mut *tx)
        .await?;
    print_pets(&all);

    tx.commit().await?;
    Ok(PostgresOutcome { selected, all })
}

/// Runs the raw driver walkthrough against PostgreSQL, if one is configured.
pub async fn run(ctx: &LessonContext) -> Result<()> {
    let Some(url) = ctx.config.postgres_url.as_deref() else {
        warn!("POSTGRES_URL is not set, skipping the PostgreSQL driver lesson");
        return Ok(());
    };
    let pool = connect(url).await?;
    run_statements(&pool, "cat").await?;
    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_config, test_seed};

    #[tokio::test]
    async fn test_skipped_without_url() -> Result<()> {
        let mut config = test_config();
        config.postgres_url = None;
        run(&LessonContext::new(config, test_seed()?)).await
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server in POSTGRES_URL"]
    async fn test_statements_against_postgres() -> Result<()> {
        let url = std::env::var("POSTGRES_URL")?;
        let pool = connect(&url).await?;
        let outcome = run_statements(&pool, "cat").await?;

        let selected: Vec<&str> = outcome.selected.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(selected, vec!["Sam", "Yuna", "Vlad"]);

        let ages: Vec<(String, i32)> = outcome
            .all
            .into_iter()
            .map(|p| (p.name, p.age))
            .collect();
        assert_eq!(
            ages,
            vec![
                ("Max".to_string(), 6),
                ("Sam".to_string(), 111),
                ("Jerome".to_string(), 22),
                ("Yuna".to_string(), 113),
                ("Vlad".to_string(), 104),
            ]
        );
        Ok(())
    }
}
