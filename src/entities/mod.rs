//! Entity module - SeaORM models for the example schemas.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod address;
pub mod animal;
pub mod customer;
pub mod product;
pub mod purchase;
pub mod shop;
pub mod species;
pub mod user;

// Re-export specific types to avoid conflicts
pub use address::{Column as AddressColumn, Entity as Address, Model as AddressModel};
pub use animal::{Column as AnimalColumn, Entity as Animal, Model as AnimalModel};
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
pub use shop::{Column as ShopColumn, Entity as Shop, Model as ShopModel};
pub use species::{Column as SpeciesColumn, Entity as Species, Model as SpeciesModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
