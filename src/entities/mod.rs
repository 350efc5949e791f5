//! Entity module - SeaORM definitions for the `profiles` and `items` tables.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod item;
pub mod profile;

pub use item::{Column as ItemColumn, Entity as Item, Model as ItemModel};
pub use profile::{Column as ProfileColumn, Entity as Profile, Model as ProfileModel};
