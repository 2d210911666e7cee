//! Joins and the rest of the advanced query toolbox, run against the zoo.

use crate::{
    core::{TableDef, display, to_sql_string},
    errors::{Error, Result},
    lessons::{
        LessonContext,
        zoo::{self, animal_table, species_table},
    },
};
use sea_orm::{
    ConnectionTrait,
    sea_query::{
        Alias, CommonTableExpression, Expr, JoinType, Order, Query, SelectStatement, SimpleExpr,
        WithClause,
    },
};
use tracing::debug;

/// One printable query of the lesson.
#[derive(Debug, Clone)]
pub struct JoinQuery {
    /// Heading above the result table
    pub title: &'static str,
    /// Output column labels, in select order
    pub labels: &'static [&'static str],
    /// `WITH` clause placed in front of `select`
    pub with: Option<WithClause>,
    /// The query itself
    pub select: SelectStatement,
}

impl JoinQuery {
    fn new(title: &'static str, labels: &'static [&'static str], select: SelectStatement) -> Self {
        Self {
            title,
            labels,
            with: None,
            select,
        }
    }

    /// Result rows as text.
    pub async fn fetch<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<Vec<Option<String>>>> {
        let labels: Vec<String> = self.labels.iter().map(|l| (*l).to_string()).collect();
        display::fetch_rows(conn, self.select.clone(), self.with.clone(), &labels).await
    }

    /// Prints the SQL and the rendered result.
    pub async fn print<C: ConnectionTrait>(&self, conn: &C) -> Result<()> {
        let backend = conn.get_database_backend();
        let sql = match &self.with {
            Some(with) => to_sql_string(backend, &self.select.clone().with(with.clone())),
            None => to_sql_string(backend, &self.select),
        };
        println!("SQL: {sql}");
        let rendered = display::render_with(
            conn,
            self.title,
            self.with.clone(),
            self.select.clone(),
            self.labels,
        )
        .await?;
        println!("{rendered}");
        Ok(())
    }
}

fn col(table: &str, column: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(column)))
}

/// `child.fk = parent.key`, taken from the foreign key declared on `child`.
pub fn foreign_key_condition(child: &TableDef, parent: &TableDef) -> Result<SimpleExpr> {
    let (column, reference) =
        child
            .foreign_key_to(&parent.name)
            .ok_or_else(|| Error::NoForeignKey {
                from: child.name.clone(),
                to: parent.name.clone(),
            })?;
    let target = (Alias::new(&parent.name), Alias::new(&reference.column));
    Ok(col(&child.name, &column.name).equals(target))
}

/// `animal JOIN species` with the ON clause derived from the foreign key.
pub fn animals_with_species() -> Result<JoinQuery> {
    let (animal, species) = (animal_table(), species_table());
    let mut select = Query::select();
    select
        .expr_as(col("animal", "name"), Alias::new("name"))
        .expr_as(col("species", "id"), Alias::new("species"))
        .expr_as(col("species", "description"), Alias::new("description"))
        .from(Alias::new("animal"))
        .inner_join(Alias::new("species"), foreign_key_condition(&animal, &species)?)
        .order_by((Alias::new("animal"), Alias::new("id")), Order::Asc);
    Ok(JoinQuery::new(
        "animals and their species",
        &["name", "species", "description"],
        select,
    ))
}

/// `species JOIN menu` on an explicit condition: only species with a menu.
#[must_use]
pub fn species_with_menus() -> JoinQuery {
    let mut select = Query::select();
    select
        .expr_as(col("species", "id"), Alias::new("species"))
        .expr_as(col("menu", "menu"), Alias::new("menu"))
        .expr_as(col("menu", "price"), Alias::new("price"))
        .from(Alias::new("species"))
        .inner_join(
            Alias::new("menu"),
            col("species", "id").equals((Alias::new("menu"), Alias::new("animal"))),
        )
        .order_by((Alias::new("menu"), Alias::new("id")), Order::Asc);
    JoinQuery::new("species with a menu", &["species", "menu", "price"], select)
}

/// `species LEFT JOIN menu`: every species, NULL where nothing is on the menu.
#[must_use]
pub fn all_species_and_menus() -> JoinQuery {
    let mut select = Query::select();
    select
        .expr_as(col("species", "id"), Alias::new("species"))
        .expr_as(col("menu", "menu"), Alias::new("menu"))
        .from(Alias::new("species"))
        .left_join(
            Alias::new("menu"),
            col("species", "id").equals((Alias::new("menu"), Alias::new("animal"))),
        )
        .order_by((Alias::new("species"), Alias::new("id")), Order::Asc)
        .order_by((Alias::new("menu"), Alias::new("id")), Order::Asc);
    JoinQuery::new("all species, menu or not", &["species", "menu"], select)
}

/// `menu AS m1 JOIN menu AS m2`: every pair of dishes for the same animal.
#[must_use]
pub fn menu_pairs() -> JoinQuery {
    let mut select = Query::select();
    select
        .expr_as(col("m1", "animal"), Alias::new("animal"))
        .expr_as(col("m1", "menu"), Alias::new("first_menu"))
        .expr_as(col("m2", "menu"), Alias::new("second_menu"))
        .expr_as(
            col("m1", "price").add(col("m2", "price")),
            Alias::new("total_price"),
        )
        .from_as(Alias::new("menu"), Alias::new("m1"))
        .join_as(
            JoinType::InnerJoin,
            Alias::new("menu"),
            Alias::new("m2"),
            col("m1", "animal").equals((Alias::new("m2"), Alias::new("animal"))),
        )
        .order_by((Alias::new("m1"), Alias::new("id")), Order::Asc)
        .order_by((Alias::new("m2"), Alias::new("id")), Order::Asc);
    JoinQuery::new(
        "menu combinations",
        &["animal", "first_menu", "second_menu", "total_price"],
        select,
    )
}

/// A subquery in FROM: the dishes for `species`, joined to the animals of it.
#[must_use]
pub fn menus_for(species: &str) -> JoinQuery {
    let mut dishes = Query::select();
    dishes
        .columns(["animal", "menu", "price"].map(Alias::new))
        .from(Alias::new("menu"))
        .and_where(Expr::col(Alias::new("animal")).eq(species));

    let mut select = Query::select();
    select
        .expr_as(col("animal", "name"), Alias::new("name"))
        .expr_as(col("dishes", "menu"), Alias::new("menu"))
        .expr_as(col("dishes", "price"), Alias::new("price"))
        .from_subquery(dishes, Alias::new("dishes"))
        .inner_join(
            Alias::new("animal"),
            col("animal", "species").equals((Alias::new("dishes"), Alias::new("animal"))),
        )
        .order_by((Alias::new("animal"), Alias::new("id")), Order::Asc)
        .order_by((Alias::new("dishes"), Alias::new("menu")), Order::Asc);
    JoinQuery::new("who eats what", &["name", "menu", "price"], select)
}

/// `GROUP BY species` with a labelled `count`.
#[must_use]
pub fn animals_per_species() -> JoinQuery {
    let mut select = Query::select();
    select
        .expr_as(col("animal", "species"), Alias::new("species"))
        .expr_as(col("animal", "id").count(), Alias::new("animals"))
        .from(Alias::new("animal"))
        .group_by_col((Alias::new("animal"), Alias::new("species")))
        .order_by((Alias::new("animal"), Alias::new("species")), Order::Asc);
    JoinQuery::new("animals per species", &["species", "animals"], select)
}

/// `WITH combos AS (<menu pairs>) SELECT DISTINCT ...`
#[must_use]
pub fn fed_animals_cte() -> JoinQuery {
    let cte = CommonTableExpression::new()
        .query(menu_pairs().select)
        .table_name(Alias::new("combos"))
        .to_owned();

    let mut select = Query::select();
    select
        .distinct()
        .expr_as(col("combos", "animal"), Alias::new("Animal"))
        .from(Alias::new("combos"))
        .order_by((Alias::new("combos"), Alias::new("animal")), Order::Asc);

    let mut query = JoinQuery::new("animals with a menu (CTE)", &["Animal"], select);
    query.with = Some(WithClause::new().cte(cte).to_owned());
    query
}

/// Every query of the lesson, in the order it prints them.
pub fn lesson_queries() -> Result<Vec<JoinQuery>> {
    Ok(vec![
        animals_with_species()?,
        species_with_menus(),
        all_species_and_menus(),
        menu_pairs(),
        menus_for("Fish"),
        animals_per_species(),
        fed_animals_cte(),
    ])
}

/// Builds the zoo and prints every join variant.
pub async fn run(ctx: &LessonContext) -> Result<()> {
    let db = ctx.connect().await?;
    let metadata = zoo::setup_zoo(&db, &ctx.seed).await?;
    for query in lesson_queries()? {
        debug!(title = query.title, "Running join query");
        query.print(&db).await?;
    }
    // the ORM lessons recreate species and animal from their entities
    metadata.drop_all(&db, true).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{setup_empty_db, test_seed};
    use sea_orm::{DatabaseConnection, DbBackend};

    async fn setup() -> Result<DatabaseConnection> {
        let db = setup_empty_db().await?;
        zoo::setup_zoo(&db, &test_seed()?).await?;
        Ok(db)
    }

    fn column(rows: &[Vec<Option<String>>], index: usize) -> Vec<Option<&str>> {
        rows.iter().map(|r| r[index].as_deref()).collect()
    }

    #[test]
    fn test_foreign_key_condition_needs_a_foreign_key() {
        let condition = foreign_key_condition(&animal_table(), &species_table());
        assert!(condition.is_ok());

        let reversed = foreign_key_condition(&species_table(), &animal_table());
        assert!(matches!(reversed, Err(Error::NoForeignKey { .. })));
    }

    #[tokio::test]
    async fn test_inner_joins() -> Result<()> {
        let db = setup().await?;

        let rows = animals_with_species()?.fetch(&db).await?;
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[3][2].as_deref(), Some("Swims in the water"));

        let rows = species_with_menus().fetch(&db).await?;
        assert_eq!(column(&rows, 0), vec![Some("Fish"), Some("Fish"), Some("Cat")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_left_join_keeps_species_without_menu() -> Result<()> {
        let db = setup().await?;
        let rows = all_species_and_menus().fetch(&db).await?;
        assert_eq!(rows.len(), 5);

        let missing: Vec<_> = rows
            .iter()
            .filter(|r| r[1].is_none())
            .map(|r| r[0].as_deref().unwrap())
            .collect();
        assert_eq!(missing, vec!["Dog", "Parrot"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_self_join_pairs() -> Result<()> {
        let db = setup().await?;
        let rows = menu_pairs().fetch(&db).await?;
        // Fish has two dishes (4 pairs), Cat and Hamster one each
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().any(|r| {
            r[1].as_deref() == Some("Fish brulee")
                && r[2].as_deref() == Some("Fish flambee")
                && r[3].as_deref() == Some("29.0")
        }));
        Ok(())
    }

    #[tokio::test]
    async fn test_subquery_in_from() -> Result<()> {
        let db = setup().await?;
        let rows = menus_for("Fish").fetch(&db).await?;
        assert_eq!(
            column(&rows, 0),
            vec![Some("Nemo"), Some("Nemo"), Some("Dory"), Some("Dory")]
        );
        assert!(menus_for("Dog").fetch(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_group_by_count() -> Result<()> {
        let db = setup().await?;
        let rows = animals_per_species().fetch(&db).await?;
        let counted: Vec<_> = rows
            .iter()
            .map(|r| (r[0].clone().unwrap(), r[1].clone().unwrap()))
            .collect();
        assert_eq!(
            counted,
            vec![
                ("Cat".to_string(), "1".to_string()),
                ("Dog".to_string(), "2".to_string()),
                ("Fish".to_string(), "2".to_string()),
                ("Parrot".to_string(), "1".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_cte_distinct() -> Result<()> {
        let db = setup().await?;
        let query = fed_animals_cte();
        let sql = to_sql_string(
            DbBackend::Sqlite,
            &query.select.clone().with(query.with.clone().unwrap()),
        );
        assert!(sql.starts_with(r#"WITH "combos" AS (SELECT "m1"."animal""#));
        assert!(sql.contains(r#"JOIN "menu" AS "m2""#));

        let rows = query.fetch(&db).await?;
        assert_eq!(
            column(&rows, 0),
            vec![Some("Cat"), Some("Fish"), Some("Hamster")]
        );
        Ok(())
    }
}
