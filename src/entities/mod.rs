//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

/// Orders with their frozen price snapshot
pub mod order;
/// Catalog products
pub mod product;

pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use product::{
    BenefitTags, Column as ProductColumn, Entity as Product, Model as ProductModel,
    ProductCategory,
};
