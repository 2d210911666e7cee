//! Textual SQL with named bind parameters.
//!
//! Statements are written with `:name` placeholders and compiled to the
//! positional style of the connected backend (`?` or `$n`). Placeholders
//! inside single-quoted literals or double-quoted identifiers are left alone,
//! as are PostgreSQL `::type` casts.

use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, DbBackend, ExecResult, QueryResult, Statement, Value};
use tracing::debug;

/// A textual statement plus the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    sql: String,
    binds: Vec<(String, Value)>,
}

/// Wraps raw SQL so it can be bound and executed.
pub fn text(sql: impl Into<String>) -> TextQuery {
    TextQuery {
        sql: sql.into(),
        binds: Vec::new(),
    }
}

impl TextQuery {
    /// Binds `value` to every `:name` placeholder.
    #[must_use]
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.binds.iter_mut().find(|(bound, _)| bound == name) {
            Some(slot) => slot.1 = value,
            None => self.binds.push((name.to_string(), value)),
        }
        self
    }

    /// The SQL as written.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        self.binds
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| Error::MissingBind {
                name: name.to_string(),
            })
    }

    /// Compiles to a positional statement for `backend`.
    pub fn statement(&self, backend: DbBackend) -> Result<Statement> {
        let (sql, values) = self.compile(backend)?;
        debug!(%sql, "Compiled textual SQL");
        Ok(Statement::from_sql_and_values(backend, sql, values))
    }

    fn compile(&self, backend: DbBackend) -> Result<(String, Vec<Value>)> {
        let mut sql = String::with_capacity(self.sql.len());
        let mut values = Vec::new();
        let mut quote: Option<char> = None;
        let mut chars = self.sql.chars().peekable();

        while let Some(c) = chars.next() {
            if let Some(open) = quote {
                sql.push(c);
                if c == open {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' => {
                    quote = Some(c);
                    sql.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    sql.push(c);
                    for n in chars.by_ref() {
                        sql.push(n);
                        if n == '\n' {
                            break;
                        }
                    }
                }
                '/' if chars.peek() == Some(&'*') => {
                    sql.push(c);
                    sql.push('*');
                    chars.next();
                    let mut previous = '\0';
                    for n in chars.by_ref() {
                        sql.push(n);
                        if previous == '*' && n == '/' {
                            break;
                        }
                        previous = n;
                    }
                }
                ':' if chars.peek() == Some(&':') => {
                    sql.push_str("::");
                    chars.next();
                }
                ':' if chars
                    .peek()
                    .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
                {
                    let mut name = String::new();
                    while let Some(n) = chars.peek() {
                        if n.is_ascii_alphanumeric() || *n == '_' {
                            name.push(*n);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    values.push(self.lookup(&name)?);
                    if backend == DbBackend::Postgres {
                        sql.push_str(&format!("${}", values.len()));
                    } else {
                        sql.push('?');
                    }
                }
                _ => sql.push(c),
            }
        }
        Ok((sql, values))
    }

    /// Runs a statement that returns no rows.
    pub async fn execute<C: ConnectionTrait>(&self, conn: &C) -> Result<ExecResult> {
        let stmt = self.statement(conn.get_database_backend())?;
        conn.execute(stmt).await.map_err(Into::into)
    }

    /// Runs a query and returns every row.
    pub async fn fetch_all<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<QueryResult>> {
        let stmt = self.statement(conn.get_database_backend())?;
        conn.query_all(stmt).await.map_err(Into::into)
    }

    /// Runs a query and returns the first row, if any.
    pub async fn fetch_one<C: ConnectionTrait>(&self, conn: &C) -> Result<Option<QueryResult>> {
        let stmt = self.statement(conn.get_database_backend())?;
        conn.query_one(stmt).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_sqlite_placeholders_are_positional() {
        let query = text("insert into person(name, age) values (:name, :age)")
            .bind("name", "Wolverine")
            .bind("age", 65);
        let (sql, values) = query.compile(DbBackend::Sqlite).unwrap();

        assert_eq!(sql, "insert into person(name, age) values (?, ?)");
        assert_eq!(values, vec![Value::from("Wolverine"), Value::from(65)]);
    }

    #[test]
    fn test_postgres_placeholders_are_numbered_and_repeat() {
        let query = text("select * from person where name = :name or nick = :name and id = :id")
            .bind("id", 3)
            .bind("name", "Rogue");
        let (sql, values) = query.compile(DbBackend::Postgres).unwrap();

        assert_eq!(sql, "select * from person where name = $1 or nick = $2 and id = $3");
        assert_eq!(
            values,
            vec![Value::from("Rogue"), Value::from("Rogue"), Value::from(3)]
        );
    }

    #[test]
    fn test_quotes_and_casts_are_untouched() {
        let query = text("select ':skip', \"odd:name\", age::text from person where id = :id")
            .bind("id", 1);
        let (sql, values) = query.compile(DbBackend::Postgres).unwrap();

        assert_eq!(
            sql,
            "select ':skip', \"odd:name\", age::text from person where id = $1"
        );
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_comments_are_not_placeholders() {
        let query = text("SELECT :id -- note: :later\nFROM t /* :skipped */ WHERE a = :id")
            .bind("id", 7);
        let (sql, values) = query.compile(DbBackend::Sqlite).unwrap();
        assert_eq!(sql, "SELECT ? -- note: :later\nFROM t /* :skipped */ WHERE a = ?");
        assert_eq!(values.len(), 2);

        assert!(text("SELECT 1 -- note: :later").compile(DbBackend::Sqlite).is_ok());
    }

    #[test]
    fn test_missing_bind_is_reported() {
        let result = text("select * from person where name = :name").statement(DbBackend::Sqlite);
        assert!(matches!(result, Err(Error::MissingBind { name }) if name == "name"));
    }

    #[test]
    fn test_rebinding_replaces_value() {
        let query = text("select :x").bind("x", 1).bind("x", 2);
        let (_, values) = query.compile(DbBackend::Sqlite).unwrap();
        assert_eq!(values, vec![Value::from(2)]);
    }
}
