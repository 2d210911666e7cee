//! Shop entity - one side of the shop system's many-to-many purchases.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shop database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Shop name, unique across the system
    #[sea_orm(unique)]
    pub name: String,
}

/// Defines relationships between Shop and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One shop records many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

/// Customers who bought something in this shop, through `purchase`
impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        super::purchase::Relation::Customer.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::purchase::Relation::Shop.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
