//! Animal entity - zoo inhabitants, each pointing at its species.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Animal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "animal")]
pub struct Model {
    /// Unique identifier, taken from the seed data
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    /// `"male"` or `"female"`
    pub gender: String,
    /// Name the animal answers to
    pub name: String,
    /// Foreign key to `species.id`
    pub species: String,
    /// Date and time of birth, when known
    pub birthday: Option<DateTime>,
    /// Sale price in dollars
    pub price: Option<f64>,
}

/// Defines relationships between Animal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each animal belongs to one species
    #[sea_orm(
        belongs_to = "super::species::Entity",
        from = "Column::Species",
        to = "super::species::Column::Id"
    )]
    Species,
}

impl Related<super::species::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Species.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
