//! Customer entity - buyers in the shop system.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Age is optional for customers
    pub age: Option<i32>,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer makes many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

/// Shops this customer bought from, through `purchase`
impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        super::purchase::Relation::Shop.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::purchase::Relation::Customer.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
