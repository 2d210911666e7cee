//! Table metadata - an ordered collection of table definitions.
//!
//! A [`MetaData`] holds [`TableDef`]s built by hand (or reconstructed through
//! reflection) and knows how to create and drop all of them in foreign key
//! order. Definitions compile to `sea-query` DDL for whichever backend the
//! connection speaks.

use crate::{
    core::inspect::{self, ReflectedTable},
    errors::Result,
};
use sea_orm::{
    ConnectionTrait, DbBackend,
    sea_query::{
        Alias, ColumnDef, Expr, ForeignKey, ForeignKeyAction, Table, TableCreateStatement,
        TableDropStatement,
    },
};
use tracing::{debug, instrument};

/// Logical column types and the SQL types they are emitted as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// `VARCHAR`, optionally with a length
    String(Option<u32>),
    /// Unbounded `TEXT`
    Text,
    /// `INTEGER`
    Integer,
    /// `BIGINT`
    BigInteger,
    /// `BOOLEAN` (integer on engines without one)
    Boolean,
    /// Fixed set of string values, emitted as `VARCHAR` plus a `CHECK (.. IN ..)`
    Enum {
        /// Type name, kept for engines with native enum types
        name: String,
        /// Allowed values
        variants: Vec<String>,
    },
    /// `TIMESTAMP` / `DATETIME`
    DateTime,
    /// `DATE`
    Date,
    /// Binary large object
    Blob,
    /// Exact numeric with precision and scale
    Decimal(u32, u32),
    /// Floating point
    Float,
    /// `JSON`
    Json,
}

impl ColumnKind {
    /// Builds an enum kind from string slices.
    #[must_use]
    pub fn enumeration(name: &str, variants: &[&str]) -> Self {
        Self::Enum {
            name: name.to_string(),
            variants: variants.iter().map(|v| (*v).to_string()).collect(),
        }
    }

    /// Generic SQL type the kind maps to, for display.
    #[must_use]
    pub const fn sql_type(&self) -> &'static str {
        match self {
            Self::String(_) | Self::Enum { .. } => "VARCHAR",
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::BigInteger => "BIGINT",
            Self::Boolean => "BOOLEAN",
            Self::DateTime => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Blob => "BLOB",
            Self::Decimal(..) => "DECIMAL",
            Self::Float => "FLOAT",
            Self::Json => "JSON",
        }
    }

    /// Best-effort inverse of the DDL type names reported by reflection.
    #[must_use]
    pub fn from_sql_type(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        let (base, args) = match lowered.split_once('(') {
            Some((base, rest)) => (base.trim(), rest.trim_end_matches(')')),
            None => (lowered.as_str(), ""),
        };
        let numbers: Vec<u32> = args
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect();

        match base {
            "bigint" | "int8" | "bigserial" => Self::BigInteger,
            "bool" | "boolean" => Self::Boolean,
            "date" => Self::Date,
            "blob" | "bytea" | "binary" | "varbinary" => Self::Blob,
            "json" | "jsonb" | "json_text" => Self::Json,
            "decimal" | "numeric" => match numbers.as_slice() {
                [precision, scale] => Self::Decimal(*precision, *scale),
                [precision] => Self::Decimal(*precision, 0),
                _ => Self::Decimal(10, 0),
            },
            "real" | "float" | "double" | "double precision" | "float4" | "float8" => Self::Float,
            "text" | "clob" => Self::Text,
            b if b.contains("int") || b == "serial" => Self::Integer,
            b if b.contains("char") || b == "string" => Self::String(numbers.first().copied()),
            b if b.starts_with("timestamp") || b == "datetime" => Self::DateTime,
            _ => Self::Text,
        }
    }
}

/// What happens to referencing rows when the referenced row goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Delete them too
    Cascade,
    /// Null out the foreign key
    SetNull,
    /// Refuse the delete
    Restrict,
}

impl From<OnDelete> for ForeignKeyAction {
    fn from(value: OnDelete) -> Self {
        match value {
            OnDelete::Cascade => Self::Cascade,
            OnDelete::SetNull => Self::SetNull,
            OnDelete::Restrict => Self::Restrict,
        }
    }
}

/// Target of a foreign key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignRef {
    /// Referenced table
    pub table: String,
    /// Referenced column
    pub column: String,
    /// Action when the referenced row is deleted
    pub on_delete: Option<OnDelete>,
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Logical type
    pub kind: ColumnKind,
    /// Part of the primary key
    pub primary_key: bool,
    /// Accepts NULL
    pub nullable: bool,
    /// Filled by the engine on insert
    pub auto_increment: bool,
    /// Foreign key target, if any
    pub references: Option<ForeignRef>,
}

impl Column {
    /// A nullable, non-key column.
    #[must_use]
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            primary_key: false,
            nullable: true,
            auto_increment: false,
            references: None,
        }
    }

    /// Marks the column as the primary key (implies NOT NULL).
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Adds a NOT NULL constraint.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Lets the engine generate values.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Adds a foreign key to `table.column`.
    #[must_use]
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.references = Some(ForeignRef {
            table: table.to_string(),
            column: column.to_string(),
            on_delete: None,
        });
        self
    }

    /// Sets the delete action of the foreign key added by [`Column::references`].
    #[must_use]
    pub fn on_delete(mut self, action: OnDelete) -> Self {
        if let Some(reference) = self.references.as_mut() {
            reference.on_delete = Some(action);
        }
        self
    }

    fn to_column_def(&self) -> ColumnDef {
        let mut def = ColumnDef::new(Alias::new(&self.name));
        match &self.kind {
            ColumnKind::String(Some(len)) => def.string_len(*len),
            ColumnKind::String(None) => def.string(),
            ColumnKind::Text => def.text(),
            ColumnKind::Integer => def.integer(),
            ColumnKind::BigInteger => def.big_integer(),
            ColumnKind::Boolean => def.boolean(),
            ColumnKind::Enum { variants, .. } => def
                .string()
                .check(Expr::col(Alias::new(&self.name)).is_in(variants.iter().cloned())),
            ColumnKind::DateTime => def.date_time(),
            ColumnKind::Date => def.date(),
            ColumnKind::Blob => def.binary(),
            ColumnKind::Decimal(precision, scale) => def.decimal_len(*precision, *scale),
            ColumnKind::Float => def.float(),
            ColumnKind::Json => def.json(),
        };
        if !self.nullable {
            def.not_null();
        }
        if self.primary_key {
            def.primary_key();
        }
        if self.auto_increment {
            def.auto_increment();
        }
        def
    }
}

/// Definition of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<Column>,
}

impl TableDef {
    /// An empty table definition.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Tables this one points at through foreign keys.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref().map(|r| r.table.as_str()))
            .collect()
    }

    /// The first column holding a foreign key to `table`.
    #[must_use]
    pub fn foreign_key_to(&self, table: &str) -> Option<(&Column, &ForeignRef)> {
        self.columns.iter().find_map(|c| {
            c.references
                .as_ref()
                .filter(|r| r.table == table)
                .map(|r| (c, r))
        })
    }

    /// `CREATE TABLE` statement; `checkfirst` adds `IF NOT EXISTS`.
    #[must_use]
    pub fn create_statement(&self, checkfirst: bool) -> TableCreateStatement {
        let mut stmt = Table::create();
        stmt.table(Alias::new(&self.name));
        if checkfirst {
            stmt.if_not_exists();
        }
        for column in &self.columns {
            stmt.col(&mut column.to_column_def());
            if let Some(reference) = &column.references {
                let mut fk = ForeignKey::create();
                fk.from(Alias::new(&self.name), Alias::new(&column.name))
                    .to(Alias::new(&reference.table), Alias::new(&reference.column));
                if let Some(action) = reference.on_delete {
                    fk.on_delete(action.into());
                }
                stmt.foreign_key(&mut fk);
            }
        }
        stmt
    }

    /// `DROP TABLE` statement; `checkfirst` adds `IF EXISTS`.
    #[must_use]
    pub fn drop_statement(&self, checkfirst: bool) -> TableDropStatement {
        let mut stmt = Table::drop();
        stmt.table(Alias::new(&self.name));
        if checkfirst {
            stmt.if_exists();
        }
        stmt
    }

    /// The DDL this definition compiles to on `backend`.
    #[must_use]
    pub fn create_sql(&self, backend: DbBackend) -> String {
        backend.build(&self.create_statement(false)).sql
    }

    /// Creates the table. With `checkfirst` an existing table is left alone.
    #[instrument(skip(self, conn), fields(table = %self.name))]
    pub async fn create_table<C: ConnectionTrait>(&self, conn: &C, checkfirst: bool) -> Result<()> {
        let backend = conn.get_database_backend();
        conn.execute(backend.build(&self.create_statement(checkfirst)))
            .await?;
        debug!("Created table");
        Ok(())
    }

    /// Drops the table. Without `checkfirst` a missing table is an error.
    #[instrument(skip(self, conn), fields(table = %self.name))]
    pub async fn drop_table<C: ConnectionTrait>(&self, conn: &C, checkfirst: bool) -> Result<()> {
        let backend = conn.get_database_backend();
        conn.execute(backend.build(&self.drop_statement(checkfirst)))
            .await?;
        debug!("Dropped table");
        Ok(())
    }
}

impl From<ReflectedTable> for TableDef {
    fn from(reflected: ReflectedTable) -> Self {
        let columns = reflected
            .columns
            .into_iter()
            .map(|info| {
                let reference = reflected
                    .foreign_keys
                    .iter()
                    .find(|fk| fk.column == info.name)
                    .map(|fk| ForeignRef {
                        table: fk.referred_table.clone(),
                        column: fk.referred_column.clone(),
                        on_delete: None,
                    });
                Column {
                    kind: ColumnKind::from_sql_type(&info.data_type),
                    name: info.name,
                    primary_key: info.primary_key,
                    nullable: info.nullable,
                    auto_increment: false,
                    references: reference,
                }
            })
            .collect();
        Self {
            name: reflected.name,
            columns,
        }
    }
}

/// Ordered collection of table definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaData {
    tables: Vec<TableDef>,
}

impl MetaData {
    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table, replacing any previous definition with the same name.
    pub fn add(&mut self, table: TableDef) -> &TableDef {
        let index = match self.tables.iter().position(|t| t.name == table.name) {
            Some(index) => {
                self.tables[index] = table;
                index
            }
            None => {
                self.tables.push(table);
                self.tables.len() - 1
            }
        };
        &self.tables[index]
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table names in registration order.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables ordered so that every referenced table precedes the tables
    /// pointing at it. Registration order is kept otherwise; tables caught in
    /// a reference cycle keep their registration order at the end.
    #[must_use]
    pub fn sorted_tables(&self) -> Vec<&TableDef> {
        let mut sorted: Vec<&TableDef> = Vec::with_capacity(self.tables.len());
        let mut pending: Vec<&TableDef> = self.tables.iter().collect();

        while !pending.is_empty() {
            let ready = pending.iter().position(|table| {
                table.dependencies().iter().all(|dep| {
                    *dep == table.name
                        || self.table(dep).is_none()
                        || sorted.iter().any(|done| done.name == *dep)
                })
            });
            match ready {
                Some(index) => sorted.push(pending.remove(index)),
                None => {
                    sorted.append(&mut pending);
                }
            }
        }
        sorted
    }

    /// Creates every table, referenced tables first.
    #[instrument(skip(self, conn))]
    pub async fn create_all<C: ConnectionTrait>(&self, conn: &C, checkfirst: bool) -> Result<()> {
        for table in self.sorted_tables() {
            table.create_table(conn, checkfirst).await?;
        }
        Ok(())
    }

    /// Drops every table, referencing tables first.
    #[instrument(skip(self, conn))]
    pub async fn drop_all<C: ConnectionTrait>(&self, conn: &C, checkfirst: bool) -> Result<()> {
        for table in self.sorted_tables().into_iter().rev() {
            table.drop_table(conn, checkfirst).await?;
        }
        Ok(())
    }

    /// Rebuilds metadata for every table found in the connected database.
    pub async fn reflect<C: ConnectionTrait>(conn: &C) -> Result<Self> {
        let mut metadata = Self::new();
        for table in inspect::reflect(conn).await? {
            metadata.add(table.into());
        }
        Ok(metadata)
    }

    /// Reflects a single table into this collection.
    pub async fn reflect_table<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        name: &str,
    ) -> Result<&TableDef> {
        let reflected = inspect::reflect_table(conn, name).await?;
        Ok(self.add(reflected.into()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_empty_db;

    fn species() -> TableDef {
        TableDef::new("species")
            .column(Column::new("id", ColumnKind::String(Some(100))).primary_key())
            .column(Column::new("description", ColumnKind::Text))
    }

    fn animal() -> TableDef {
        TableDef::new("animal")
            .column(Column::new("id", ColumnKind::Integer).primary_key())
            .column(
                Column::new("gender", ColumnKind::enumeration("gender", &["male", "female"]))
                    .not_null(),
            )
            .column(Column::new("species", ColumnKind::String(Some(100))).references("species", "id"))
    }

    #[test]
    fn test_sorted_tables_puts_referenced_tables_first() {
        let mut metadata = MetaData::new();
        metadata.add(animal());
        metadata.add(species());

        let order: Vec<&str> = metadata
            .sorted_tables()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(order, vec!["species", "animal"]);
        assert_eq!(metadata.table_names(), vec!["animal", "species"]);
    }

    #[test]
    fn test_add_replaces_table_with_same_name() {
        let mut metadata = MetaData::new();
        metadata.add(species());
        metadata.add(TableDef::new("species").column(Column::new("id", ColumnKind::Integer)));

        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.table("species").unwrap().column_names(), vec!["id"]);
    }

    #[test]
    fn test_foreign_key_to() {
        let animal = animal();
        let (column, reference) = animal.foreign_key_to("species").unwrap();
        assert_eq!(column.name, "species");
        assert_eq!(reference.column, "id");
        assert!(animal.foreign_key_to("menu").is_none());
        assert!(species().foreign_key_to("animal").is_none());
    }

    #[test]
    fn test_create_sql_contains_constraints() {
        let sql = animal().create_sql(DbBackend::Sqlite);
        assert!(sql.starts_with("CREATE TABLE \"animal\""));
        assert!(sql.contains("CHECK"));
        assert!(sql.contains("'male'"));
        assert!(sql.contains("REFERENCES \"species\""));
    }

    #[test]
    fn test_from_sql_type() {
        assert_eq!(ColumnKind::from_sql_type("varchar(100)"), ColumnKind::String(Some(100)));
        assert_eq!(ColumnKind::from_sql_type("INTEGER"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_sql_type("bigint"), ColumnKind::BigInteger);
        assert_eq!(ColumnKind::from_sql_type("decimal(10, 2)"), ColumnKind::Decimal(10, 2));
        assert_eq!(ColumnKind::from_sql_type("timestamp_text"), ColumnKind::DateTime);
        assert_eq!(ColumnKind::from_sql_type("character varying"), ColumnKind::String(None));
        assert_eq!(ColumnKind::from_sql_type("double precision"), ColumnKind::Float);
    }

    #[tokio::test]
    async fn test_create_all_and_drop_all() -> Result<()> {
        let db = setup_empty_db().await?;
        let mut metadata = MetaData::new();
        metadata.add(animal());
        metadata.add(species());

        metadata.create_all(&db, false).await?;
        assert_eq!(inspect::table_names(&db).await?, vec!["animal", "species"]);

        // checkfirst skips tables that already exist
        metadata.create_all(&db, true).await?;

        metadata.drop_all(&db, false).await?;
        assert!(inspect::table_names(&db).await?.is_empty());

        // dropping missing tables only fails without checkfirst
        metadata.drop_all(&db, true).await?;
        assert!(metadata.drop_all(&db, false).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_reflect_round_trips_structure() -> Result<()> {
        let db = setup_empty_db().await?;
        let mut metadata = MetaData::new();
        metadata.add(species());
        metadata.add(animal());
        metadata.create_all(&db, false).await?;

        let reflected = MetaData::reflect(&db).await?;
        assert_eq!(reflected.table_names(), vec!["animal", "species"]);

        let animal = reflected.table("animal").unwrap();
        assert_eq!(animal.column_names(), vec!["id", "gender", "species"]);
        assert!(animal.get_column("id").unwrap().primary_key);
        assert!(!animal.get_column("gender").unwrap().nullable);
        let reference = animal.get_column("species").unwrap().references.clone().unwrap();
        assert_eq!(reference.table, "species");
        assert_eq!(reference.column, "id");

        let species = reflected.table("species").unwrap();
        assert_eq!(
            species.get_column("id").unwrap().kind,
            ColumnKind::String(Some(100))
        );
        Ok(())
    }
}
