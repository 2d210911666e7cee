//! ORM - units of work over entities instead of statements over tables.
//!
//! Users own addresses (one-to-many, cascading delete); animals belong to a
//! species (many-to-one). Updates only write the columns that were set on the
//! active model.

use crate::{
    config::{database::reset_tables, seed::SeedData},
    core::{one_exact, one_or_none, print_table},
    entities::{
        Address, AddressModel, Animal, AnimalModel, Species, SpeciesModel, User, UserModel,
        address, animal, species, user,
    },
    errors::Result,
    lessons::LessonContext,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IdenStatic,
    Iterable, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument};

/// Adds a user and their addresses as one unit of work.
#[instrument(skip(db, addresses))]
pub async fn add_user_with_addresses(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
    age: i32,
    addresses: &[(&str, &str)],
) -> Result<(UserModel, Vec<AddressModel>)> {
    let txn = db.begin().await?;
    let user = user::ActiveModel {
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        age: Set(age),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut saved = Vec::with_capacity(addresses.len());
    for (street, city) in addresses {
        let address = address::ActiveModel {
            user_id: Set(user.id),
            street: Set((*street).to_string()),
            city: Set((*city).to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        saved.push(address);
    }
    txn.commit().await?;

    debug!(user_id = user.id, addresses = saved.len(), "Flushed new user");
    Ok((user, saved))
}

/// Names of the columns an active model would write on update.
#[must_use]
pub fn changed_columns(model: &user::ActiveModel) -> Vec<String> {
    user::Column::iter()
        .filter(|column| model.get(*column).is_set())
        .map(|column| column.as_str().to_string())
        .collect()
}

/// Sets a new age, writing only the `age` column. Returns the updated row
/// and the columns that were written.
pub async fn change_age(
    db: &DatabaseConnection,
    user: UserModel,
    age: i32,
) -> Result<(UserModel, Vec<String>)> {
    let mut active: user::ActiveModel = user.into();
    active.age = Set(age);
    let changed = changed_columns(&active);
    let updated = active.update(db).await?;
    Ok((updated, changed))
}

/// Looks a user up by primary key.
pub async fn find_user(db: &DatabaseConnection, id: i32) -> Result<Option<UserModel>> {
    Ok(User::find_by_id(id).one(db).await?)
}

/// Addresses of `user`, loaded on demand.
pub async fn addresses_of(db: &DatabaseConnection, user: &UserModel) -> Result<Vec<AddressModel>> {
    Ok(user
        .find_related(Address)
        .order_by_asc(address::Column::Id)
        .all(db)
        .await?)
}

/// Every user with all of their addresses, loaded up front.
pub async fn users_with_addresses(
    db: &DatabaseConnection,
) -> Result<Vec<(UserModel, Vec<AddressModel>)>> {
    Ok(User::find()
        .order_by_asc(user::Column::Id)
        .find_with_related(Address)
        .all(db)
        .await?)
}

/// Deletes a user; the database removes their addresses with them.
#[instrument(skip(db, user), fields(user_id = user.id))]
pub async fn remove_user(db: &DatabaseConnection, user: UserModel) -> Result<u64> {
    let result = user.delete(db).await?;
    Ok(result.rows_affected)
}

/// Inserts the seed species and animals through their entities.
pub async fn load_animals<C: ConnectionTrait>(db: &C, seed: &SeedData) -> Result<()> {
    if seed.species.is_empty() || seed.animals.is_empty() {
        return Ok(());
    }
    let species = seed.species.iter().map(|s| species::ActiveModel {
        id: Set(s.id.clone()),
        description: Set(s.description.clone()),
    });
    let inserted = Species::insert_many(species).exec_without_returning(db).await?;
    debug!(inserted, "Loaded species");

    let mut animals = Vec::with_capacity(seed.animals.len());
    for a in &seed.animals {
        animals.push(animal::ActiveModel {
            id: Set(a.id),
            gender: Set(a.gender.clone()),
            name: Set(a.name.clone()),
            species: Set(a.species.clone()),
            birthday: Set(a.birthday()?),
            price: Set(a.price),
        });
    }
    let inserted = Animal::insert_many(animals).exec_without_returning(db).await?;
    debug!(inserted, "Loaded animals");
    Ok(())
}

/// Every animal next to its species.
pub async fn animals_with_species(
    db: &DatabaseConnection,
) -> Result<Vec<(AnimalModel, Option<SpeciesModel>)>> {
    Ok(Animal::find()
        .order_by_asc(animal::Column::Id)
        .find_also_related(Species)
        .all(db)
        .await?)
}

async fn exactly_one_demo(db: &DatabaseConnection) -> Result<()> {
    let charles = one_exact(db, User::find().filter(user::Column::FirstName.eq("Charles"))).await?;
    println!("exactly one Charles: {charles:?}");

    match one_exact(db, User::find().filter(user::Column::FirstName.eq("Jean"))).await {
        Ok(user) => println!("unexpected: {user:?}"),
        Err(e) => println!("exactly one Jean: {e}"),
    }
    match one_exact(db, User::find().filter(user::Column::Age.gt(30))).await {
        Ok(user) => println!("unexpected: {user:?}"),
        Err(e) => println!("exactly one user over 30: {e}"),
    }
    let nobody = one_or_none(db, User::find().filter(user::Column::Age.gt(200))).await?;
    println!("one or none over 200: {nobody:?}");
    Ok(())
}

/// Adds, reads, changes and removes users, then walks both relationships.
pub async fn run(ctx: &LessonContext) -> Result<()> {
    let db = ctx.connect().await?;
    reset_tables(&db).await?;

    println!("**** Unit of work: add + flush ****");
    let (charles, _) = add_user_with_addresses(
        &db,
        "Charles",
        "Xavier",
        83,
        &[("1407 Graymalkin Lane", "Salem Center")],
    )
    .await?;
    let (logan, _) = add_user_with_addresses(
        &db,
        "Logan",
        "Howlett",
        65,
        &[("Lone Pine Road", "Alberta"), ("Princess Street", "Madripoor")],
    )
    .await?;
    add_user_with_addresses(&db, "Scott", "Summers", 33, &[]).await?;
    print_table(&db, "user").await?;
    print_table(&db, "address").await?;

    println!("**** Identity by primary key ****");
    let found = find_user(&db, logan.id).await?;
    println!("user {}: {found:?}", logan.id);
    println!("same row: {}", found.as_ref() == Some(&logan));

    println!("**** Change tracking ****");
    let (logan, changed) = change_age(&db, logan, 66).await?;
    println!("columns written: {}", changed.join(", "));
    info!(age = logan.age, "Logan had a birthday");

    println!("**** Exactly one ****");
    exactly_one_demo(&db).await?;

    println!("**** Lazy and eager relationships ****");
    for address in addresses_of(&db, &logan).await? {
        println!("lazy: {} lives at {}, {}", logan.first_name, address.street, address.city);
    }
    for (user, addresses) in users_with_addresses(&db).await? {
        println!("eager: {} has {} address(es)", user.first_name, addresses.len());
    }

    println!("**** Delete cascades to addresses ****");
    remove_user(&db, charles).await?;
    print_table(&db, "user").await?;
    print_table(&db, "address").await?;
    println!("addresses left: {}", Address::find().count(&db).await?);

    println!("**** Many-to-one: animal -> species ****");
    load_animals(&db, &ctx.seed).await?;
    for (animal, species) in animals_with_species(&db).await? {
        let description = species
            .and_then(|s| s.description)
            .unwrap_or_else(|| "unknown".to_string());
        println!("{} the {} ({description})", animal.name, animal.species);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        errors::Error,
        test_utils::{create_test_user, setup_test_db, test_seed},
    };

    #[tokio::test]
    async fn test_add_user_with_addresses() -> Result<()> {
        let db = setup_test_db().await?;
        let (user, addresses) = add_user_with_addresses(
            &db,
            "Logan",
            "Howlett",
            65,
            &[("Lone Pine Road", "Alberta"), ("Princess Street", "Madripoor")],
        )
        .await?;

        assert_eq!(addresses.len(), 2);
        assert!(addresses.iter().all(|a| a.user_id == user.id));
        assert_eq!(find_user(&db, user.id).await?, Some(user.clone()));
        assert_eq!(addresses_of(&db, &user).await?, addresses);
        Ok(())
    }

    #[tokio::test]
    async fn test_only_changed_columns_are_written() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "Scott", "Summers", 33).await?;

        let untouched: user::ActiveModel = user.clone().into();
        assert!(changed_columns(&untouched).is_empty());

        let (updated, changed) = change_age(&db, user, 34).await?;
        assert_eq!(changed, vec!["age"]);
        assert_eq!(updated.age, 34);
        assert_eq!(updated.first_name, "Scott");
        Ok(())
    }

    #[tokio::test]
    async fn test_eager_loading_groups_addresses() -> Result<()> {
        let db = setup_test_db().await?;
        add_user_with_addresses(&db, "Charles", "Xavier", 83, &[("Graymalkin Lane", "Salem")])
            .await?;
        add_user_with_addresses(&db, "Scott", "Summers", 33, &[]).await?;

        let loaded = users_with_addresses(&db).await?;
        let counts: Vec<_> = loaded
            .iter()
            .map(|(u, a)| (u.first_name.as_str(), a.len()))
            .collect();
        assert_eq!(counts, vec![("Charles", 1), ("Scott", 0)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_user_cascades() -> Result<()> {
        let db = setup_test_db().await?;
        let (charles, _) =
            add_user_with_addresses(&db, "Charles", "Xavier", 83, &[("Graymalkin Lane", "Salem")])
                .await?;
        let (_, kept) =
            add_user_with_addresses(&db, "Logan", "Howlett", 65, &[("Lone Pine Road", "Alberta")])
                .await?;

        assert_eq!(remove_user(&db, charles).await?, 1);
        assert_eq!(Address::find().all(&db).await?, kept);
        Ok(())
    }

    #[tokio::test]
    async fn test_exactly_one_errors() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "Anna", "Marie", 22).await?;
        create_test_user(&db, "Erik", "Lehnsherr", 22).await?;

        let result = one_exact(&db, User::find().filter(user::Column::Age.eq(22))).await;
        assert!(matches!(result, Err(Error::MultipleResultsFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_animals_with_species() -> Result<()> {
        let db = setup_test_db().await?;
        load_animals(&db, &test_seed()?).await?;

        let rows = animals_with_species(&db).await?;
        assert_eq!(rows.len(), 6);
        let (nemo, fish) = &rows[3];
        assert_eq!(nemo.name, "Nemo");
        assert_eq!(
            fish.as_ref().and_then(|s| s.description.as_deref()),
            Some("Swims in the water")
        );
        assert!(rows[4].0.birthday.is_none());
        Ok(())
    }
}
