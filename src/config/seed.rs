//! Seed rows for the example schemas.
//!
//! The default data set ships inside the binary (`data/seed.toml`); a
//! different file can be supplied through `seed_path`.

use crate::errors::{Error, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::Path;

const EMBEDDED_SEED: &str = include_str!("../../data/seed.toml");
const BIRTHDAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Every seed table.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    /// Rows for `species`
    #[serde(default)]
    pub species: Vec<SpeciesSeed>,
    /// Rows for `animal`
    #[serde(default)]
    pub animals: Vec<AnimalSeed>,
    /// Rows for `menu`
    #[serde(default)]
    pub menus: Vec<MenuSeed>,
    /// Rows for `user`
    #[serde(default)]
    pub users: Vec<UserSeed>,
}

/// One species.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesSeed {
    /// Species name, also the primary key
    pub id: String,
    /// Free text description
    pub description: Option<String>,
}

/// One animal.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimalSeed {
    /// Primary key
    pub id: i32,
    /// `"male"` or `"female"`
    pub gender: String,
    /// Name
    pub name: String,
    /// Species name (foreign key)
    pub species: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub birthday: Option<String>,
    /// Price in dollars
    pub price: Option<f64>,
}

impl AnimalSeed {
    /// Parsed birthday.
    pub fn birthday(&self) -> Result<Option<NaiveDateTime>> {
        self.birthday
            .as_deref()
            .map(|raw| {
                NaiveDateTime::parse_from_str(raw, BIRTHDAY_FORMAT).map_err(|e| Error::Config {
                    message: format!("Invalid birthday {raw:?} for {}: {e}", self.name),
                })
            })
            .transpose()
    }
}

/// One menu entry. `animal` is deliberately not a foreign key.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuSeed {
    /// Species the dish is meant for
    pub animal: String,
    /// Dish name
    pub menu: String,
    /// Price in dollars
    pub price: f64,
}

/// One user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSeed {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Age in years
    pub age: i32,
}

/// Parses seed data from TOML text.
pub fn parse_seed(contents: &str) -> Result<SeedData> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed data: {e}"),
    })
}

/// Loads seed data from `path`, or the embedded default when `None`.
pub fn load_seed(path: Option<&Path>) -> Result<SeedData> {
    match path {
        Some(path) => parse_seed(&std::fs::read_to_string(path)?),
        None => parse_seed(EMBEDDED_SEED),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_embedded_seed_parses() {
        let seed = load_seed(None).unwrap();
        assert_eq!(seed.species.len(), 4);
        assert_eq!(seed.animals.len(), 6);
        assert_eq!(seed.menus.len(), 4);
        assert_eq!(seed.users.len(), 6);

        // every animal points at a seeded species
        for animal in &seed.animals {
            assert!(seed.species.iter().any(|s| s.id == animal.species));
            animal.birthday().unwrap();
        }
    }

    #[test]
    fn test_birthday_parsing() {
        let seed = parse_seed(
            r#"
            [[animals]]
            id = 1
            gender = "male"
            name = "Rex"
            species = "Dog"
            birthday = "2019-04-12 08:30:00"

            [[animals]]
            id = 2
            gender = "female"
            name = "Bella"
            species = "Dog"
            birthday = "yesterday"
            "#,
        )
        .unwrap();

        let rex = seed.animals[0].birthday().unwrap().unwrap();
        assert_eq!(rex.to_string(), "2019-04-12 08:30:00");
        assert!(seed.animals[1].birthday().is_err());
        assert!(seed.species.is_empty());
    }

    #[test]
    fn test_menu_price() {
        let seed = parse_seed(
            r#"
            [[menus]]
            animal = "Fish"
            menu = "Fish brulee"
            price = 10.0
            "#,
        )
        .unwrap();
        assert_eq!(seed.menus[0].price, 10.0);
    }
}
