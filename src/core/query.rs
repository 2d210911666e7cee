//! Query helpers shared by the lessons.
//!
//! `one_exact` and `one_or_none` give ORM selects "exactly one" semantics;
//! `to_statement` compiles any `sea-query` statement for the connected backend.

use crate::errors::{Error, Result};
use sea_orm::{
    ConnectionTrait, DbBackend, EntityTrait, QuerySelect, Select, Statement,
    sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, QueryStatementWriter, SqliteQueryBuilder},
};

fn entity_name<E: EntityTrait>() -> String {
    E::default().table_name().to_string()
}

/// Fetches exactly one row. Zero rows and more than one row are both errors.
pub async fn one_exact<E, C>(conn: &C, select: Select<E>) -> Result<E::Model>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut rows = select.limit(2).all(conn).await?;
    match rows.len() {
        0 => Err(Error::NoResultFound {
            entity: entity_name::<E>(),
        }),
        1 => Ok(rows.remove(0)),
        _ => Err(Error::MultipleResultsFound {
            entity: entity_name::<E>(),
        }),
    }
}

/// Fetches at most one row. More than one row is an error.
pub async fn one_or_none<E, C>(conn: &C, select: Select<E>) -> Result<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    match one_exact(conn, select).await {
        Ok(model) => Ok(Some(model)),
        Err(Error::NoResultFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Compiles a query-builder statement into a backend statement with bound values.
pub fn to_statement<S: QueryStatementWriter>(backend: DbBackend, stmt: &S) -> Statement {
    let (sql, values) = match backend {
        DbBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DbBackend::MySql => stmt.build(MysqlQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    };
    Statement::from_sql_and_values(backend, sql, values)
}

/// Renders a query-builder statement as SQL with values inlined, for display.
pub fn to_sql_string<S: QueryStatementWriter>(backend: DbBackend, stmt: &S) -> String {
    match backend {
        DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DbBackend::MySql => stmt.to_string(MysqlQueryBuilder),
        _ => stmt.to_string(SqliteQueryBuilder),
    }
}
