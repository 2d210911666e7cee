//! Console rendering of tables and query results.
//!
//! Every selected value is cast to text in SQL before it is fetched, so rows
//! of any shape render without knowing their Rust types up front.
//!
//! The cast happens in an outer `SELECT` over the original query, which has
//! no `ORDER BY` of its own. Row order is whatever the inner query produced;
//! SQLite and PostgreSQL keep it for a plain projection like this one, but
//! SQL does not promise it.

use crate::{
    core::{inspect, query::to_statement},
    errors::Result,
};
use comfy_table::{Table, presets::ASCII_FULL};
use sea_orm::{
    ConnectionTrait,
    sea_query::{Alias, Expr, Query, SelectStatement, WithClause},
};
use tracing::instrument;

const NULL: &str = "NULL";
const SUBQUERY: &str = "q";

/// Banner printed above every rendered table.
#[must_use]
pub fn banner(title: &str) -> String {
    format!("************ {} ************", title.to_uppercase())
}

/// Lays out already-fetched rows. `None` cells print as `NULL`.
#[must_use]
pub fn format_rows(columns: &[String], rows: &[Vec<Option<String>>]) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL).set_header(columns);
    for row in rows {
        table.add_row(row.iter().map(|cell| cell.as_deref().unwrap_or(NULL)));
    }
    table.to_string()
}

/// Wraps `select` as a subquery and casts each labelled column to text.
fn text_projection(select: SelectStatement, labels: &[String]) -> SelectStatement {
    let mut outer = Query::select();
    for label in labels {
        outer.expr_as(
            Expr::col((Alias::new(SUBQUERY), Alias::new(label))).cast_as(Alias::new("TEXT")),
            Alias::new(label),
        );
    }
    outer.from_subquery(select, Alias::new(SUBQUERY));
    outer
}

/// Runs `select` (optionally behind a `WITH` clause) and returns its
/// `labels` columns as text.
pub async fn fetch_rows<C: ConnectionTrait>(
    conn: &C,
    select: SelectStatement,
    with: Option<WithClause>,
    labels: &[String],
) -> Result<Vec<Vec<Option<String>>>> {
    let backend = conn.get_database_backend();
    let projected = text_projection(select, labels);
    let stmt = match with {
        Some(clause) => to_statement(backend, &projected.with(clause)),
        None => to_statement(backend, &projected),
    };
    let rows = conn.query_all(stmt).await?;
    rows.iter()
        .map(|row| {
            labels
                .iter()
                .map(|label| row.try_get::<Option<String>>("", label).map_err(Into::into))
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

/// Fetches every row of `table` with columns named through reflection.
pub async fn fetch_table<C: ConnectionTrait>(
    conn: &C,
    table: &str,
) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
    let columns: Vec<String> = inspect::get_columns(conn, table)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let mut select = Query::select();
    select.column(sea_orm::sea_query::Asterisk).from(Alias::new(table));
    let rows = fetch_rows(conn, select, None, &columns).await?;
    Ok((columns, rows))
}

/// `SELECT * FROM <table>` rendered under a banner.
#[instrument(skip(conn))]
pub async fn render_table<C: ConnectionTrait>(conn: &C, table: &str) -> Result<String> {
    let (columns, rows) = fetch_table(conn, table).await?;
    Ok(format!(
        "{}\n{}",
        banner(&format!("table {table}")),
        format_rows(&columns, &rows)
    ))
}

/// Prints a whole table to stdout.
pub async fn print_table<C: ConnectionTrait>(conn: &C, table: &str) -> Result<()> {
    println!("{}", render_table(conn, table).await?);
    Ok(())
}

/// Renders the result of a query-builder select whose output columns are `labels`.
pub async fn render_select<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    select: SelectStatement,
    labels: &[&str],
) -> Result<String> {
    render_with(conn, title, None, select, labels).await
}

/// Like [`render_select`], with a `WITH` clause in front of the query.
pub async fn render_with<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    with: Option<WithClause>,
    select: SelectStatement,
    labels: &[&str],
) -> Result<String> {
    let labels: Vec<String> = labels.iter().map(|l| (*l).to_string()).collect();
    let rows = fetch_rows(conn, select, with, &labels).await?;
    Ok(format!("{}\n{}", banner(title), format_rows(&labels, &rows)))
}

/// Prints the result of a query-builder select to stdout.
pub async fn print_select<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    select: SelectStatement,
    labels: &[&str],
) -> Result<()> {
    println!("{}", render_select(conn, title, select, labels).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::setup_empty_db};

    #[test]
    fn test_banner() {
        assert_eq!(banner("table person"), "************ TABLE PERSON ************");
    }

    #[test]
    fn test_format_rows_prints_null() {
        let rendered = format_rows(
            &["name".to_string(), "age".to_string()],
            &[vec![Some("Maxine".to_string()), None]],
        );
        assert!(rendered.contains("name"));
        assert!(rendered.contains("Maxine"));
        assert!(rendered.contains("NULL"));
    }

    #[tokio::test]
    async fn test_fetch_table_casts_everything_to_text() -> Result<()> {
        let db = setup_empty_db().await?;
        db.execute_unprepared("CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT, height REAL)")
            .await?;
        db.execute_unprepared(
            "INSERT INTO person (id, name, height) VALUES (1, 'Maxine', 1.75), (2, NULL, NULL)",
        )
        .await?;

        let (columns, rows) = fetch_table(&db, "person").await?;
        assert_eq!(columns, vec!["id", "name", "height"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].as_deref(), Some("1"));
        assert_eq!(rows[0][1].as_deref(), Some("Maxine"));
        assert_eq!(rows[0][2].as_deref(), Some("1.75"));
        assert_eq!(rows[1][1], None);

        let rendered = render_table(&db, "person").await?;
        assert!(rendered.starts_with("************ TABLE PERSON ************"));
        Ok(())
    }

    #[tokio::test]
    async fn test_render_table_of_unknown_table() -> Result<()> {
        let db = setup_empty_db().await?;
        let result = render_table(&db, "ghost").await;
        assert!(matches!(result, Err(Error::TableNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_render_select_with_labels() -> Result<()> {
        let db = setup_empty_db().await?;
        db.execute_unprepared("CREATE TABLE menu (animal TEXT, price REAL)")
            .await?;
        db.execute_unprepared("INSERT INTO menu VALUES ('Fish', 10.0), ('Fish', 19.0), ('Cat', 12.5)")
            .await?;

        let mut select = Query::select();
        select
            .expr_as(Expr::col(Alias::new("animal")), Alias::new("animal"))
            .expr_as(Expr::col(Alias::new("price")).count(), Alias::new("n"))
            .from(Alias::new("menu"))
            .group_by_col(Alias::new("animal"))
            .order_by(Alias::new("animal"), sea_orm::sea_query::Order::Asc);

        let rendered = render_select(&db, "menus per animal", select, &["animal", "n"]).await?;
        assert!(rendered.contains("MENUS PER ANIMAL"));
        assert!(rendered.contains("Fish"));
        assert!(rendered.contains('2'));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_rows_keeps_inner_order() -> Result<()> {
        let db = setup_empty_db().await?;
        db.execute_unprepared("CREATE TABLE menu (animal TEXT, price REAL)")
            .await?;
        db.execute_unprepared(
            "INSERT INTO menu VALUES ('Fish', 10.0), ('Cat', 12.5), ('Fish', 19.0), ('Dog', 3.0)",
        )
        .await?;

        let mut select = Query::select();
        select
            .column(Alias::new("price"))
            .from(Alias::new("menu"))
            .order_by(Alias::new("price"), sea_orm::sea_query::Order::Desc)
            .limit(3);

        let rows = fetch_rows(&db, select, None, &["price".to_string()]).await?;
        let prices: Vec<_> = rows.iter().map(|r| r[0].clone().unwrap()).collect();
        assert_eq!(prices, vec!["19.0", "12.5", "10.0"]);
        Ok(())
    }
}
