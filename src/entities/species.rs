//! Species entity - lookup table keyed by the species name.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Species database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "species")]
pub struct Model {
    /// Species name, e.g. `"Fish"`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Free text description
    pub description: Option<String>,
}

/// Defines relationships between Species and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One species has many animals
    #[sea_orm(has_many = "super::animal::Entity")]
    Animals,
}

impl Related<super::animal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Animals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
