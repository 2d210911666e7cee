//! Reflection - reading table structure back out of a live database.
//!
//! SQLite answers through its `pragma_*` table-valued functions, PostgreSQL
//! through `information_schema` restricted to the current schema.

use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, DbBackend, QueryResult, Statement, Value};
use tracing::{debug, instrument};

/// One column as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared SQL type, as the engine spells it
    pub data_type: String,
    /// Accepts NULL
    pub nullable: bool,
    /// Default expression, if any
    pub default: Option<String>,
    /// Part of the primary key
    pub primary_key: bool,
}

/// One foreign key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    /// Local column
    pub column: String,
    /// Table it points at
    pub referred_table: String,
    /// Column it points at
    pub referred_column: String,
}

/// Everything reflection knows about a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedTable {
    /// Table name
    pub name: String,
    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,
    /// Foreign keys declared on the table
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

const SQLITE_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

const POSTGRES_TABLES: &str = "SELECT table_name::text AS name FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' ORDER BY table_name";

const SQLITE_COLUMNS: &str = "SELECT name, type, \"notnull\", dflt_value, pk \
     FROM pragma_table_info(?) ORDER BY cid";

const POSTGRES_COLUMNS: &str = "SELECT c.column_name::text AS name, \
            c.data_type::text AS type, \
            c.is_nullable = 'YES' AS nullable, \
            c.column_default::text AS dflt_value, \
            EXISTS ( \
                SELECT 1 FROM information_schema.table_constraints tc \
                JOIN information_schema.key_column_usage k \
                  ON tc.constraint_name = k.constraint_name AND tc.table_schema = k.table_schema \
                WHERE tc.constraint_type = 'PRIMARY KEY' \
                  AND tc.table_schema = c.table_schema \
                  AND tc.table_name = c.table_name \
                  AND k.column_name = c.column_name \
            ) AS pk \
     FROM information_schema.columns c \
     WHERE c.table_schema = current_schema() AND c.table_name = $1 \
     ORDER BY c.ordinal_position";

const SQLITE_FOREIGN_KEYS: &str = "SELECT \"from\", \"table\", \"to\" \
     FROM pragma_foreign_key_list(?) ORDER BY id, seq";

const POSTGRES_FOREIGN_KEYS: &str = "SELECT kcu.column_name::text AS \"from\", \
            ccu.table_name::text AS \"table\", \
            ccu.column_name::text AS \"to\" \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
     JOIN information_schema.constraint_column_usage ccu \
       ON tc.constraint_name = ccu.constraint_name AND tc.table_schema = ccu.table_schema \
     WHERE tc.constraint_type = 'FOREIGN KEY' \
       AND tc.table_schema = current_schema() AND tc.table_name = $1 \
     ORDER BY kcu.ordinal_position";

fn unsupported(backend: DbBackend) -> Error {
    Error::Config {
        message: format!("Reflection is not supported for {backend:?}"),
    }
}

fn table_statement(backend: DbBackend, sql: &str, table: &str) -> Statement {
    Statement::from_sql_and_values(backend, sql, [Value::from(table)])
}

/// Names of all user tables in the connected database, sorted.
#[instrument(skip(conn))]
pub async fn table_names<C: ConnectionTrait>(conn: &C) -> Result<Vec<String>> {
    let backend = conn.get_database_backend();
    let sql = match backend {
        DbBackend::Sqlite => SQLITE_TABLES,
        DbBackend::Postgres => POSTGRES_TABLES,
        other => return Err(unsupported(other)),
    };
    let rows = conn
        .query_all(Statement::from_string(backend, sql))
        .await?;
    rows.iter()
        .map(|row| row.try_get::<String>("", "name").map_err(Into::into))
        .collect()
}

/// True when `table` exists in the connected database.
pub async fn has_table<C: ConnectionTrait>(conn: &C, table: &str) -> Result<bool> {
    Ok(table_names(conn).await?.iter().any(|name| name == table))
}

fn column_from_row(backend: DbBackend, row: &QueryResult) -> Result<ColumnInfo> {
    let (nullable, primary_key) = if backend == DbBackend::Postgres {
        (
            row.try_get::<bool>("", "nullable")?,
            row.try_get::<bool>("", "pk")?,
        )
    } else {
        (
            row.try_get::<i64>("", "notnull")? == 0,
            row.try_get::<i64>("", "pk")? > 0,
        )
    };
    Ok(ColumnInfo {
        name: row.try_get("", "name")?,
        data_type: row.try_get("", "type")?,
        nullable,
        default: row.try_get("", "dflt_value")?,
        primary_key,
    })
}

/// Columns of `table` in ordinal order.
///
/// A table without columns does not exist as far as the engines are
/// concerned, so an empty answer is reported as [`Error::TableNotFound`].
#[instrument(skip(conn))]
pub async fn get_columns<C: ConnectionTrait>(conn: &C, table: &str) -> Result<Vec<ColumnInfo>> {
    let backend = conn.get_database_backend();
    let sql = match backend {
        DbBackend::Sqlite => SQLITE_COLUMNS,
        DbBackend::Postgres => POSTGRES_COLUMNS,
        other => return Err(unsupported(other)),
    };
    let rows = conn.query_all(table_statement(backend, sql, table)).await?;
    if rows.is_empty() {
        return Err(Error::TableNotFound {
            name: table.to_string(),
        });
    }
    debug!(count = rows.len(), "Reflected columns");
    rows.iter().map(|row| column_from_row(backend, row)).collect()
}

/// Foreign keys declared on `table`.
#[instrument(skip(conn))]
pub async fn get_foreign_keys<C: ConnectionTrait>(
    conn: &C,
    table: &str,
) -> Result<Vec<ForeignKeyInfo>> {
    let backend = conn.get_database_backend();
    let sql = match backend {
        DbBackend::Sqlite => SQLITE_FOREIGN_KEYS,
        DbBackend::Postgres => POSTGRES_FOREIGN_KEYS,
        other => return Err(unsupported(other)),
    };
    let rows = conn.query_all(table_statement(backend, sql, table)).await?;
    let mut foreign_keys = Vec::with_capacity(rows.len());
    for row in &rows {
        let referred_table: String = row.try_get("", "table")?;
        // SQLite leaves "to" NULL for `REFERENCES parent` without a column
        let referred_column = match row.try_get::<Option<String>>("", "to")? {
            Some(column) => column,
            None => primary_key_of(conn, table, &referred_table).await?,
        };
        foreign_keys.push(ForeignKeyInfo {
            column: row.try_get("", "from")?,
            referred_table,
            referred_column,
        });
    }
    Ok(foreign_keys)
}

async fn primary_key_of<C: ConnectionTrait>(conn: &C, from: &str, table: &str) -> Result<String> {
    get_columns(conn, table)
        .await?
        .into_iter()
        .find(|column| column.primary_key)
        .map(|column| column.name)
        .ok_or_else(|| Error::NoForeignKey {
            from: from.to_string(),
            to: table.to_string(),
        })
}

/// Reflects a single table.
pub async fn reflect_table<C: ConnectionTrait>(conn: &C, table: &str) -> Result<ReflectedTable> {
    Ok(ReflectedTable {
        name: table.to_string(),
        columns: get_columns(conn, table).await?,
        foreign_keys: get_foreign_keys(conn, table).await?,
    })
}

/// Reflects every user table of the connected database.
pub async fn reflect<C: ConnectionTrait>(conn: &C) -> Result<Vec<ReflectedTable>> {
    let mut tables = Vec::new();
    for name in table_names(conn).await? {
        tables.push(reflect_table(conn, &name).await?);
    }
    Ok(tables)
}
