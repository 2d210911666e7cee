//! Declarative models - a small shop system.
//!
//! Customers buy products in shops; `purchase` is the association table that
//! links all three and disappears with any of its parents.

use crate::{
    config::database::reset_tables,
    core::{one_exact, print_table},
    entities::{
        Customer, CustomerModel, Product, ProductModel, Purchase, Shop, ShopModel, customer,
        product, purchase, shop,
    },
    errors::{Error, Result},
    lessons::LessonContext,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
    sea_query::Expr,
};
use tracing::{debug, info, instrument};

const SHOPS: [&str; 2] = ["Corner Store", "Mega Mart"];

const CUSTOMERS: [(&str, &str, Option<i32>); 3] = [
    ("Maxine", "Musterfrau", Some(34)),
    ("Logan", "Howlett", None),
    ("Scott", "Summers", Some(33)),
];

const PRODUCTS: [(&str, f64); 3] = [("Milk", 1.99), ("Bread", 2.49), ("Coffee", 8.99)];

/// (shop, customer first name, product)
const PURCHASES: [(&str, &str, &str); 6] = [
    ("Corner Store", "Maxine", "Milk"),
    ("Corner Store", "Maxine", "Bread"),
    ("Corner Store", "Logan", "Coffee"),
    ("Mega Mart", "Logan", "Milk"),
    ("Mega Mart", "Scott", "Coffee"),
    ("Mega Mart", "Scott", "Coffee"),
];

fn lookup<'a, T>(rows: &'a [T], entity: &str, matches: impl Fn(&T) -> bool) -> Result<&'a T> {
    rows.iter().find(|row| matches(*row)).ok_or_else(|| Error::NoResultFound {
        entity: entity.to_string(),
    })
}

/// Fills the shop tables in one transaction. Returns the number of purchases.
#[instrument(skip(db))]
pub async fn seed_shop_system(db: &DatabaseConnection) -> Result<usize> {
    let txn = db.begin().await?;

    let mut shops: Vec<ShopModel> = Vec::new();
    for name in SHOPS {
        let model = shop::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };
        shops.push(model.insert(&txn).await?);
    }

    let mut customers: Vec<CustomerModel> = Vec::new();
    for (first_name, last_name, age) in CUSTOMERS {
        let model = customer::ActiveModel {
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            age: Set(age),
            ..Default::default()
        };
        customers.push(model.insert(&txn).await?);
    }

    let mut products: Vec<ProductModel> = Vec::new();
    for (title, price) in PRODUCTS {
        let model = product::ActiveModel {
            title: Set(title.to_string()),
            price: Set(price),
            ..Default::default()
        };
        products.push(model.insert(&txn).await?);
    }

    for (shop_name, first_name, title) in PURCHASES {
        let shop = lookup(&shops, "shop", |s| s.name == shop_name)?;
        let customer = lookup(&customers, "customer", |c| c.first_name == first_name)?;
        let product = lookup(&products, "product", |p| p.title == title)?;
        purchase::ActiveModel {
            shop_id: Set(shop.id),
            customer_id: Set(customer.id),
            product_id: Set(product.id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    debug!(purchases = PURCHASES.len(), "Seeded shop system");
    Ok(PURCHASES.len())
}

/// Distinct customers who bought something in `shop_name`, through `purchase`.
pub async fn customers_of_shop(
    db: &DatabaseConnection,
    shop_name: &str,
) -> Result<Vec<CustomerModel>> {
    let shop = one_exact(db, Shop::find().filter(shop::Column::Name.eq(shop_name))).await?;
    Ok(shop
        .find_related(Customer)
        .distinct()
        .order_by_asc(customer::Column::Id)
        .all(db)
        .await?)
}

/// Changes the price of the product called `title`.
pub async fn reprice_product(
    db: &DatabaseConnection,
    title: &str,
    price: f64,
) -> Result<ProductModel> {
    let product = one_exact(db, Product::find().filter(product::Column::Title.eq(title))).await?;
    let mut active: product::ActiveModel = product.into();
    active.price = Set(price);
    Ok(active.update(db).await?)
}

/// Removes the customer with `first_name` and, through the cascade, their purchases.
pub async fn remove_customer(db: &DatabaseConnection, first_name: &str) -> Result<u64> {
    let customer =
        one_exact(db, Customer::find().filter(customer::Column::FirstName.eq(first_name))).await?;
    Ok(customer.delete(db).await?.rows_affected)
}

/// `SUM(product.price)` of all purchases, grouped by shop name.
pub async fn revenue_by_shop(db: &DatabaseConnection) -> Result<Vec<(String, f64)>> {
    let rows = Purchase::find()
        .select_only()
        .column_as(shop::Column::Name, "shop")
        .column_as(
            Expr::col((product::Entity, product::Column::Price)).sum(),
            "revenue",
        )
        .join(JoinType::InnerJoin, purchase::Relation::Shop.def())
        .join(JoinType::InnerJoin, purchase::Relation::Product.def())
        .group_by(shop::Column::Name)
        .order_by_asc(shop::Column::Name)
        .into_tuple::<(String, f64)>()
        .all(db)
        .await?;
    Ok(rows)
}

async fn print_revenue(db: &DatabaseConnection) -> Result<()> {
    for (shop, revenue) in revenue_by_shop(db).await? {
        println!("{shop}: {revenue:.2}");
    }
    Ok(())
}

/// Creates the shop system and runs create, read, update and delete on it.
pub async fn run(ctx: &LessonContext) -> Result<()> {
    let db = ctx.connect().await?;
    reset_tables(&db).await?;

    println!("**** Create ****");
    let purchases = seed_shop_system(&db).await?;
    info!(purchases, "Shop system ready");
    for table in ["shop", "customer", "product", "purchase"] {
        print_table(&db, table).await?;
    }

    println!("**** Read through the association ****");
    for shop in SHOPS {
        let names: Vec<String> = customers_of_shop(&db, shop)
            .await?
            .into_iter()
            .map(|c| format!("{} {}", c.first_name, c.last_name))
            .collect();
        println!("{shop} customers: {}", names.join(", "));
    }
    print_revenue(&db).await?;

    println!("**** Update ****");
    let coffee = reprice_product(&db, "Coffee", 9.49).await?;
    println!("{} now costs {:.2}", coffee.title, coffee.price);
    print_revenue(&db).await?;

    println!("**** Delete ****");
    remove_customer(&db, "Scott").await?;
    println!("purchases left: {}", Purchase::find().count(&db).await?);
    print_table(&db, "purchase").await?;
    print_revenue(&db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    async fn setup() -> Result<DatabaseConnection> {
        let db = setup_test_db().await?;
        seed_shop_system(&db).await?;
        Ok(db)
    }

    fn assert_revenue(actual: &[(String, f64)], expected: &[(&str, f64)]) {
        assert_eq!(actual.len(), expected.len());
        for ((shop, revenue), (want_shop, want_revenue)) in actual.iter().zip(expected) {
            assert_eq!(shop, want_shop);
            assert!((revenue - want_revenue).abs() < 1e-6, "{shop}: {revenue}");
        }
    }

    #[tokio::test]
    async fn test_seed_shop_system() -> Result<()> {
        let db = setup().await?;
        assert_eq!(Shop::find().count(&db).await?, 2);
        assert_eq!(Customer::find().count(&db).await?, 3);
        assert_eq!(Product::find().count(&db).await?, 3);
        assert_eq!(Purchase::find().count(&db).await?, 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_customers_of_shop_are_distinct() -> Result<()> {
        let db = setup().await?;
        let names: Vec<String> = customers_of_shop(&db, "Corner Store")
            .await?
            .into_iter()
            .map(|c| c.first_name)
            .collect();
        assert_eq!(names, vec!["Maxine", "Logan"]);

        let missing = customers_of_shop(&db, "Nowhere").await;
        assert!(matches!(missing, Err(Error::NoResultFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_revenue_follows_updates_and_deletes() -> Result<()> {
        let db = setup().await?;
        assert_revenue(
            &revenue_by_shop(&db).await?,
            &[("Corner Store", 13.47), ("Mega Mart", 19.97)],
        );

        reprice_product(&db, "Coffee", 9.49).await?;
        assert_revenue(
            &revenue_by_shop(&db).await?,
            &[("Corner Store", 13.97), ("Mega Mart", 20.97)],
        );

        assert_eq!(remove_customer(&db, "Scott").await?, 1);
        assert_eq!(Purchase::find().count(&db).await?, 4);
        assert_revenue(
            &revenue_by_shop(&db).await?,
            &[("Corner Store", 13.97), ("Mega Mart", 1.99)],
        );
        Ok(())
    }
}
