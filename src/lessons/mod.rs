//! The walkthroughs. Each lesson opens its own engine, resets the tables it
//! uses, runs its statements and prints what happened.

pub mod expressions;
pub mod joins;
pub mod metadata;
pub mod models;
pub mod orm;
pub mod postgres_driver;
pub mod sqlite_driver;
pub mod transactions;
pub mod zoo;

use crate::{
    config::{database, seed::SeedData, settings::AppConfig},
    errors::Result,
};
use clap::ValueEnum;
use sea_orm::DatabaseConnection;
use tracing::{error, info};

/// Every available lesson, in the order `all` runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Lesson {
    /// Engine, textual SQL, commit and rollback semantics
    Transactions,
    /// Table metadata, create_all / drop_all, reflection
    Metadata,
    /// Query builder: insert, select, update, delete
    Expressions,
    /// Joins, aliases, subqueries, group by, CTEs
    Joins,
    /// ORM unit of work, relationships, exactly-one queries
    Orm,
    /// Declarative models of a small shop system
    Models,
    /// Raw sqlx against SQLite
    SqliteDriver,
    /// Raw sqlx against PostgreSQL
    PostgresDriver,
}

impl Lesson {
    /// All lessons in running order.
    pub const ALL: [Self; 8] = [
        Self::Transactions,
        Self::Metadata,
        Self::Expressions,
        Self::Joins,
        Self::Orm,
        Self::Models,
        Self::SqliteDriver,
        Self::PostgresDriver,
    ];

    /// Heading printed before the lesson runs.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Transactions => "Transactions",
            Self::Metadata => "Metadata & Reflection",
            Self::Expressions => "Query Builder",
            Self::Joins => "Joins & Advanced Queries",
            Self::Orm => "ORM Sessions",
            Self::Models => "Model Declaration",
            Self::SqliteDriver => "Raw SQLite Driver",
            Self::PostgresDriver => "Raw PostgreSQL Driver",
        }
    }

    /// One line description for `--list`.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Transactions => "commit, implicit rollback, transaction blocks, savepoints",
            Self::Metadata => "define tables in code, create/drop them, reflect them back",
            Self::Expressions => "insert, select, update and delete through the query builder",
            Self::Joins => "inner/outer/self joins, subqueries, group by, common table expressions",
            Self::Orm => "unit of work, change tracking, lazy and eager relationships, cascades",
            Self::Models => "shop, customer, product and their purchases",
            Self::SqliteDriver => "cursor-style SQL with positional and numbered binds",
            Self::PostgresDriver => "the same against PostgreSQL (needs POSTGRES_URL)",
        }
    }
}

/// Settings and seed data shared by every lesson.
#[derive(Debug, Clone)]
pub struct LessonContext {
    /// Effective settings
    pub config: AppConfig,
    /// Rows used to fill the example tables
    pub seed: SeedData,
}

impl LessonContext {
    /// Bundles settings and seed data.
    #[must_use]
    pub const fn new(config: AppConfig, seed: SeedData) -> Self {
        Self { config, seed }
    }

    /// Opens a fresh engine for one lesson.
    pub async fn connect(&self) -> Result<DatabaseConnection> {
        database::create_connection(&self.config).await
    }
}

/// Runs a single lesson.
pub async fn run(lesson: Lesson, ctx: &LessonContext) -> Result<()> {
    println!("\n==================== {} ====================", lesson.title());
    info!(?lesson, "Running lesson");
    match lesson {
        Lesson::Transactions => transactions::run(ctx).await,
        Lesson::Metadata => metadata::run(ctx).await,
        Lesson::Expressions => expressions::run(ctx).await,
        Lesson::Joins => joins::run(ctx).await,
        Lesson::Orm => orm::run(ctx).await,
        Lesson::Models => models::run(ctx).await,
        Lesson::SqliteDriver => sqlite_driver::run(ctx).await,
        Lesson::PostgresDriver => postgres_driver::run(ctx).await,
    }
    .inspect(|_| info!(?lesson, "Lesson finished"))
    .inspect_err(|e| error!(?lesson, "Lesson failed: {}", e))
}

/// Runs every lesson in order, stopping at the first failure.
pub async fn run_all(ctx: &LessonContext) -> Result<()> {
    for lesson in Lesson::ALL {
        run(lesson, ctx).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_config, test_seed};

    #[test]
    fn test_every_lesson_has_a_title_and_summary() {
        for lesson in Lesson::ALL {
            assert!(!lesson.title().is_empty());
            assert!(!lesson.summary().is_empty());
        }
    }

    #[test]
    fn test_lesson_names_on_the_command_line() {
        assert_eq!(
            Lesson::from_str("sqlite-driver", true),
            Ok(Lesson::SqliteDriver)
        );
        assert!(Lesson::from_str("nope", true).is_err());
    }

    #[tokio::test]
    async fn test_run_all_against_in_memory_sqlite() -> Result<()> {
        let ctx = LessonContext::new(test_config(), test_seed()?);
        run_all(&ctx).await
    }

    #[tokio::test]
    async fn test_run_all_twice_against_one_file_database() -> Result<()> {
        let path = std::env::temp_dir().join(format!("db-walkthrough-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let config = test_config().with_overrides(
            Some(format!("sqlite://{}?mode=rwc", path.display())),
            None,
        );
        let ctx = LessonContext::new(config, test_seed()?);

        run_all(&ctx).await?;
        run_all(&ctx).await?;

        let db = ctx.connect().await?;
        let tables = crate::core::inspect::table_names(&db).await?;
        assert!(!tables.iter().any(|t| t == "person"));
        assert!(tables.iter().any(|t| t == "people"));
        db.close().await?;
        let _ = std::fs::remove_file(&path);
        Ok(())
    }
}
