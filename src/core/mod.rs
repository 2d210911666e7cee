//! Framework-agnostic helpers the lessons are built from.

/// Console rendering of tables and query results
pub mod display;
/// Reflection of existing tables
pub mod inspect;
/// Table definitions, `create_all` and `drop_all`
pub mod metadata;
/// Exactly-one queries and statement compilation
pub mod query;
/// Textual SQL with named bind parameters
pub mod text;

pub use display::{print_select, print_table, render_select, render_table};
pub use metadata::{Column, ColumnKind, ForeignRef, MetaData, OnDelete, TableDef};
pub use query::{one_exact, one_or_none, to_sql_string, to_statement};
pub use text::{TextQuery, text};
