//! Query builder - INSERT, SELECT, UPDATE and DELETE composed in code.
//!
//! Each statement is printed as SQL before it runs, then the affected table
//! or the result set is rendered.

use crate::{
    config::seed::UserSeed,
    core::{Column, ColumnKind, TableDef, print_select, print_table, to_sql_string, to_statement},
    errors::Result,
    lessons::LessonContext,
};
use sea_orm::{
    ConnectionTrait,
    sea_query::{
        Alias, DeleteStatement, Expr, InsertStatement, Order, Query, SelectStatement,
        UpdateStatement,
    },
};
use tracing::info;

const TABLE: &str = "person";

/// Columns the SELECT statements return.
pub const PERSON_COLUMNS: [&str; 4] = ["id", "first_name", "last_name", "age"];

/// `person(id, first_name, last_name, age)`
#[must_use]
pub fn person_table() -> TableDef {
    TableDef::new(TABLE)
        .column(
            Column::new("id", ColumnKind::Integer)
                .primary_key()
                .auto_increment(),
        )
        .column(Column::new("first_name", ColumnKind::String(Some(50))).not_null())
        .column(Column::new("last_name", ColumnKind::String(Some(50))).not_null())
        .column(Column::new("age", ColumnKind::Integer))
}

fn col(name: &str) -> Expr {
    Expr::col((Alias::new(TABLE), Alias::new(name)))
}

/// Multi-row INSERT of `users`.
#[must_use]
pub fn insert_users_statement(users: &[UserSeed]) -> InsertStatement {
    let mut insert = Query::insert();
    insert
        .into_table(Alias::new(TABLE))
        .columns(["first_name", "last_name", "age"].map(Alias::new));
    for user in users {
        insert.values_panic([
            user.first_name.clone().into(),
            user.last_name.clone().into(),
            user.age.into(),
        ]);
    }
    insert
}

/// Users of at least `min_age`, oldest first, at most `limit` rows.
#[must_use]
pub fn adults_statement(min_age: i32, limit: u64) -> SelectStatement {
    let mut select = Query::select();
    select
        .columns(PERSON_COLUMNS.map(|c| (Alias::new(TABLE), Alias::new(c))))
        .from(Alias::new(TABLE))
        .and_where(col("age").gte(min_age))
        .order_by((Alias::new(TABLE), Alias::new("age")), Order::Desc)
        .order_by((Alias::new(TABLE), Alias::new("id")), Order::Asc)
        .limit(limit);
    select
}

/// Users whose first name starts with `prefix`.
#[must_use]
pub fn name_prefix_statement(prefix: &str) -> SelectStatement {
    let mut select = Query::select();
    select
        .columns(PERSON_COLUMNS.map(|c| (Alias::new(TABLE), Alias::new(c))))
        .from(Alias::new(TABLE))
        .and_where(col("first_name").like(format!("{prefix}%")))
        .order_by((Alias::new(TABLE), Alias::new("id")), Order::Asc);
    select
}

/// Adds one year to everybody called `first_name`.
#[must_use]
pub fn birthday_statement(first_name: &str) -> UpdateStatement {
    Query::update()
        .table(Alias::new(TABLE))
        .value(Alias::new("age"), Expr::col(Alias::new("age")).add(1))
        .and_where(Expr::col(Alias::new("first_name")).eq(first_name))
        .to_owned()
}

/// Removes everybody younger than `age`.
#[must_use]
pub fn delete_younger_than(age: i32) -> DeleteStatement {
    Query::delete()
        .from_table(Alias::new(TABLE))
        .and_where(Expr::col(Alias::new("age")).lt(age))
        .to_owned()
}

async fn execute_printed<C, S>(conn: &C, stmt: &S) -> Result<u64>
where
    C: ConnectionTrait,
    S: sea_orm::sea_query::QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    println!("SQL: {}", to_sql_string(backend, stmt));
    let result = conn.execute(to_statement(backend, stmt)).await?;
    Ok(result.rows_affected())
}

/// Runs the four statement kinds against a fresh `person` table.
pub async fn run(ctx: &LessonContext) -> Result<()> {
    let db = ctx.connect().await?;
    let backend = db.get_database_backend();
    let table = person_table();
    table.drop_table(&db, true).await?;
    table.create_table(&db, false).await?;

    println!("**** INSERT ****");
    let inserted = execute_printed(&db, &insert_users_statement(&ctx.seed.users)).await?;
    info!(inserted, "Inserted users");
    print_table(&db, TABLE).await?;

    println!("**** SELECT ... WHERE ... ORDER BY ... LIMIT ****");
    let adults = adults_statement(30, 3);
    println!("SQL: {}", to_sql_string(backend, &adults));
    print_select(&db, "three oldest over 30", adults, &PERSON_COLUMNS).await?;

    let prefixed = name_prefix_statement("S");
    println!("SQL: {}", to_sql_string(backend, &prefixed));
    print_select(&db, "first name starts with S", prefixed, &PERSON_COLUMNS).await?;

    println!("**** UPDATE ****");
    let updated = execute_printed(&db, &birthday_statement("Logan")).await?;
    println!("rows updated: {updated}");
    print_table(&db, TABLE).await?;

    println!("**** DELETE ****");
    let deleted = execute_printed(&db, &delete_younger_than(30)).await?;
    println!("rows deleted: {deleted}");
    print_table(&db, TABLE).await?;

    table.drop_table(&db, false).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::display::fetch_rows,
        test_utils::{setup_empty_db, test_seed},
    };
    use sea_orm::{DatabaseConnection, DbBackend};

    async fn setup() -> Result<DatabaseConnection> {
        let db = setup_empty_db().await?;
        person_table().create_table(&db, false).await?;
        let insert = insert_users_statement(&test_seed()?.users);
        db.execute(to_statement(DbBackend::Sqlite, &insert)).await?;
        Ok(db)
    }

    fn labels() -> Vec<String> {
        PERSON_COLUMNS.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_statements_render_as_sql() {
        let sql = to_sql_string(DbBackend::Sqlite, &birthday_statement("Logan"));
        assert_eq!(
            sql,
            r#"UPDATE "person" SET "age" = "age" + 1 WHERE "first_name" = 'Logan'"#
        );

        let sql = to_sql_string(DbBackend::Sqlite, &delete_younger_than(30));
        assert_eq!(sql, r#"DELETE FROM "person" WHERE "age" < 30"#);

        let sql = to_sql_string(DbBackend::Postgres, &adults_statement(30, 3));
        assert!(sql.contains("LIMIT 3"));
        assert!(sql.contains(r#"ORDER BY "person"."age" DESC"#));
    }

    #[tokio::test]
    async fn test_select_with_where_order_and_limit() -> Result<()> {
        let db = setup().await?;
        let rows = fetch_rows(&db, adults_statement(30, 3), None, &labels()).await?;

        let names: Vec<_> = rows.iter().map(|r| r[1].clone().unwrap()).collect();
        assert_eq!(names, vec!["Charles", "Logan", "Maxine"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_like_prefix() -> Result<()> {
        let db = setup().await?;
        let rows = fetch_rows(&db, name_prefix_statement("S"), None, &labels()).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2].as_deref(), Some("Summers"));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_report_affected_rows() -> Result<()> {
        let db = setup().await?;
        assert_eq!(execute_printed(&db, &birthday_statement("Logan")).await?, 1);
        assert_eq!(execute_printed(&db, &birthday_statement("Nobody")).await?, 0);

        // Anna and Erik are both 22
        assert_eq!(execute_printed(&db, &delete_younger_than(30)).await?, 2);

        let rows = fetch_rows(&db, adults_statement(67, 10), None, &labels()).await?;
        let ages: Vec<_> = rows.iter().map(|r| r[3].clone().unwrap()).collect();
        assert_eq!(ages, vec!["83"]);
        Ok(())
    }
}
